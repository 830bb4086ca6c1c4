use chrono::NaiveDateTime;
use domain::{BlogId, Comment, Flags, Message, Room};
use sqlx::FromRow;

#[derive(FromRow)]
pub struct SqlComment {
    pub id: String,
    pub blog_id: String,
    pub author_id: String,
    pub content: String,
    pub flag_count: i64,
    pub is_blurred: bool,
    pub is_hidden: bool,
    pub created_at: NaiveDateTime,
}

impl From<SqlComment> for Comment {
    fn from(sql: SqlComment) -> Self {
        Comment {
            id: sql.id,
            blog_id: BlogId::new_unchecked(sql.blog_id),
            author_id: sql.author_id,
            content: sql.content,
            flags: Flags {
                count: sql.flag_count,
                is_blurred: sql.is_blurred,
            },
            is_hidden: sql.is_hidden,
            created_at: sql.created_at,
        }
    }
}

#[derive(FromRow)]
pub struct SqlUser {
    pub id: String,
    pub warnings: i64,
    pub is_active: bool,
}

// One row per (room, member); rooms are rebuilt by grouping consecutive rows.
#[derive(FromRow)]
pub struct SqlRoomMemberRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub admin_id: String,
    pub created_at: NaiveDateTime,
    pub member_id: String,
}

pub fn group_rooms(rows: Vec<SqlRoomMemberRow>) -> Vec<Room> {
    let mut rooms: Vec<Room> = Vec::new();
    for row in rows {
        match rooms.last_mut() {
            Some(room) if room.id == row.id => room.members.push(row.member_id),
            _ => rooms.push(Room {
                id: row.id,
                name: row.name,
                description: row.description,
                admin_id: row.admin_id,
                members: vec![row.member_id],
                created_at: row.created_at,
            }),
        }
    }
    rooms
}

#[derive(FromRow)]
pub struct SqlMessage {
    pub seq: i64,
    pub id: String,
    pub room_id: String,
    pub author_id: String,
    pub text: String,
    pub created_at: NaiveDateTime,
}

impl From<SqlMessage> for Message {
    fn from(sql: SqlMessage) -> Self {
        Message {
            id: sql.id,
            seq: sql.seq,
            room_id: sql.room_id,
            author_id: sql.author_id,
            text: sql.text,
            created_at: sql.created_at,
        }
    }
}
