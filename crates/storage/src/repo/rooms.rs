use crate::{
    models::{group_rooms, SqlRoomMemberRow},
    Db,
};
use chrono::Utc;
use domain::Room;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    AlreadyMember,
    RoomNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// `new_admin` is set when the leaving user was the admin.
    Left { new_admin: Option<String> },
    /// The last member left; the room and its history are gone.
    RoomDeleted,
    NotMember,
    RoomNotFound,
}

const ROOM_MEMBER_SELECT: &str = r#"
    SELECT r.id, r.name, r.description, r.admin_id, r.created_at, m.user_id AS member_id
    FROM rooms r
    JOIN room_members m ON m.room_id = r.id
"#;

// members in join order; admin succession follows the same order
const ROOM_MEMBER_ORDER: &str =
    "ORDER BY r.created_at ASC, r.id ASC, m.joined_at ASC, m.user_id ASC";

impl Db {
    /// Inserts the room with its admin as sole member.
    pub async fn create_room(&self, room: &Room) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO rooms (id, name, description, admin_id, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&room.id)
        .bind(&room.name)
        .bind(&room.description)
        .bind(&room.admin_id)
        .bind(room.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO room_members (room_id, user_id, joined_at) VALUES (?, ?, ?)")
            .bind(&room.id)
            .bind(&room.admin_id)
            .bind(room.created_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_room(&self, room_id: &str) -> anyhow::Result<Option<Room>> {
        let rows = sqlx::query_as::<_, SqlRoomMemberRow>(&format!(
            "{ROOM_MEMBER_SELECT} WHERE r.id = ? {ROOM_MEMBER_ORDER}"
        ))
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(group_rooms(rows).into_iter().next())
    }

    pub async fn list_rooms(&self) -> anyhow::Result<Vec<Room>> {
        let rows = sqlx::query_as::<_, SqlRoomMemberRow>(&format!(
            "{ROOM_MEMBER_SELECT} {ROOM_MEMBER_ORDER}"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(group_rooms(rows))
    }

    pub async fn list_rooms_for_user(&self, user_id: &str) -> anyhow::Result<Vec<Room>> {
        let rows = sqlx::query_as::<_, SqlRoomMemberRow>(&format!(
            r#"
            {ROOM_MEMBER_SELECT}
            WHERE r.id IN (SELECT room_id FROM room_members WHERE user_id = ?)
            {ROOM_MEMBER_ORDER}
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(group_rooms(rows))
    }

    pub async fn is_room_member(&self, room_id: &str, user_id: &str) -> anyhow::Result<bool> {
        let n = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM room_members WHERE room_id = ? AND user_id = ?",
        )
        .bind(room_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(n > 0)
    }

    pub async fn join_room(&self, room_id: &str, user_id: &str) -> anyhow::Result<JoinOutcome> {
        let inserted = sqlx::query(
            r#"
            INSERT OR IGNORE INTO room_members (room_id, user_id, joined_at)
            SELECT ?, ?, ?
            WHERE EXISTS (SELECT 1 FROM rooms WHERE id = ?)
            "#,
        )
        .bind(room_id)
        .bind(user_id)
        .bind(Utc::now().naive_utc())
        .bind(room_id)
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() == 1 {
            return Ok(JoinOutcome::Joined);
        }

        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM rooms WHERE id = ?")
            .bind(room_id)
            .fetch_one(&self.pool)
            .await?
            > 0;
        Ok(if exists {
            JoinOutcome::AlreadyMember
        } else {
            JoinOutcome::RoomNotFound
        })
    }

    /// Removes the member. An admin who leaves hands the role to the
    /// earliest-joined remaining member; the last member out deletes the room.
    pub async fn leave_room(&self, room_id: &str, user_id: &str) -> anyhow::Result<LeaveOutcome> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM room_members WHERE room_id = ? AND user_id = ?")
            .bind(room_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let admin_id = sqlx::query_scalar::<_, String>("SELECT admin_id FROM rooms WHERE id = ?")
            .bind(room_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(admin_id) = admin_id else {
            return Ok(LeaveOutcome::RoomNotFound);
        };
        if removed.rows_affected() == 0 {
            return Ok(LeaveOutcome::NotMember);
        }

        let successor = sqlx::query_scalar::<_, String>(
            r#"
            SELECT user_id FROM room_members
            WHERE room_id = ?
            ORDER BY joined_at ASC, user_id ASC
            LIMIT 1
            "#,
        )
        .bind(room_id)
        .fetch_optional(&mut *tx)
        .await?;

        let outcome = match successor {
            None => {
                sqlx::query("DELETE FROM messages WHERE room_id = ?")
                    .bind(room_id)
                    .execute(&mut *tx)
                    .await?;
                sqlx::query("DELETE FROM rooms WHERE id = ?")
                    .bind(room_id)
                    .execute(&mut *tx)
                    .await?;
                LeaveOutcome::RoomDeleted
            }
            Some(next) if admin_id == user_id => {
                sqlx::query("UPDATE rooms SET admin_id = ? WHERE id = ?")
                    .bind(&next)
                    .bind(room_id)
                    .execute(&mut *tx)
                    .await?;
                LeaveOutcome::Left {
                    new_admin: Some(next),
                }
            }
            Some(_) => LeaveOutcome::Left { new_admin: None },
        };

        tx.commit().await?;
        Ok(outcome)
    }
}
