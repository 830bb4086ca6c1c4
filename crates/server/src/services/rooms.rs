use chrono::Utc;
use domain::{CoreError, Room};
use storage::{Db, JoinOutcome, LeaveOutcome};
use tracing::{debug, info};

use super::ensure_active;
use crate::live::RoomHub;

const MAX_ROOM_NAME_CHARS: usize = 100;

#[derive(Clone)]
pub struct Rooms {
    db: Db,
    hub: RoomHub,
}

impl Rooms {
    pub fn new(db: Db, hub: RoomHub) -> Self {
        Self { db, hub }
    }

    pub async fn create_room(
        &self,
        name: &str,
        description: &str,
        creator_id: &str,
    ) -> Result<Room, CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::InvalidInput("Room name cannot be empty"));
        }
        if name.chars().count() > MAX_ROOM_NAME_CHARS {
            return Err(CoreError::InvalidInput("Room name is too long"));
        }
        ensure_active(&self.db, creator_id).await?;

        let room = Room {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: description.trim().to_string(),
            admin_id: creator_id.to_string(),
            members: vec![creator_id.to_string()],
            created_at: Utc::now().naive_utc(),
        };
        self.db.create_room(&room).await?;
        info!(room_id = %room.id, admin = creator_id, "Room created");
        Ok(room)
    }

    pub async fn get_room(&self, room_id: &str) -> Result<Room, CoreError> {
        self.db
            .get_room(room_id)
            .await?
            .ok_or_else(|| CoreError::not_found("room", room_id))
    }

    pub async fn join_room(&self, room_id: &str, user_id: &str) -> Result<Room, CoreError> {
        ensure_active(&self.db, user_id).await?;
        match self.db.join_room(room_id, user_id).await? {
            JoinOutcome::Joined => {
                info!(room_id, user_id, "Member joined");
                self.get_room(room_id).await
            }
            JoinOutcome::AlreadyMember => Err(CoreError::AlreadyMember),
            JoinOutcome::RoomNotFound => Err(CoreError::not_found("room", room_id)),
        }
    }

    /// Returns the room as it stands afterwards, or `None` if it was deleted.
    pub async fn leave_room(
        &self,
        room_id: &str,
        user_id: &str,
    ) -> Result<Option<Room>, CoreError> {
        match self.db.leave_room(room_id, user_id).await? {
            LeaveOutcome::Left { new_admin } => {
                self.hub.disconnect(room_id, user_id);
                info!(room_id, user_id, "Member left");
                if let Some(admin) = new_admin {
                    info!(room_id, new_admin = %admin, "Room admin reassigned");
                }
                Ok(Some(self.get_room(room_id).await?))
            }
            LeaveOutcome::RoomDeleted => {
                info!(room_id, "Last member left, room deleted");
                self.hub.close_room(room_id);
                debug!(live_rooms = self.hub.active_rooms(), "Live channels remaining");
                Ok(None)
            }
            LeaveOutcome::NotMember => Err(CoreError::NotMember),
            LeaveOutcome::RoomNotFound => Err(CoreError::not_found("room", room_id)),
        }
    }

    pub async fn ensure_member(&self, room_id: &str, user_id: &str) -> Result<(), CoreError> {
        if self.db.is_room_member(room_id, user_id).await? {
            return Ok(());
        }
        // distinguish a missing room from a missing membership
        self.get_room(room_id).await?;
        Err(CoreError::NotMember)
    }

    pub async fn list_rooms(&self) -> Result<Vec<Room>, CoreError> {
        Ok(self.db.list_rooms().await?)
    }

    pub async fn list_rooms_for_user(&self, user_id: &str) -> Result<Vec<Room>, CoreError> {
        Ok(self.db.list_rooms_for_user(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::db_with_users;
    use domain::LiveEvent;
    use futures::StreamExt;

    async fn setup(users: &[&str]) -> (Rooms, RoomHub) {
        let hub = RoomHub::new(8);
        (Rooms::new(db_with_users(users).await, hub.clone()), hub)
    }

    #[tokio::test]
    async fn test_sole_member_leaving_deletes_room() {
        let (rooms, _hub) = setup(&["alice"]).await;
        let room = rooms.create_room("general", "", "alice").await.unwrap();
        assert_eq!(room.members, vec!["alice".to_string()]);
        assert_eq!(room.admin_id, "alice");

        assert!(rooms.leave_room(&room.id, "alice").await.unwrap().is_none());
        assert!(rooms.list_rooms().await.unwrap().iter().all(|r| r.id != room.id));
        assert!(matches!(
            rooms.get_room(&room.id).await,
            Err(CoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_membership_preconditions() {
        let (rooms, _hub) = setup(&["alice", "bob"]).await;
        let room = rooms.create_room("general", "talk", "alice").await.unwrap();

        assert!(matches!(
            rooms.join_room(&room.id, "alice").await,
            Err(CoreError::AlreadyMember)
        ));
        assert!(matches!(
            rooms.leave_room(&room.id, "bob").await,
            Err(CoreError::NotMember)
        ));
        assert!(matches!(
            rooms.ensure_member(&room.id, "bob").await,
            Err(CoreError::NotMember)
        ));
        assert!(matches!(
            rooms.join_room("missing", "bob").await,
            Err(CoreError::NotFound { .. })
        ));

        let joined = rooms.join_room(&room.id, "bob").await.unwrap();
        assert!(joined.members.iter().any(|m| m == "bob"));
        rooms.ensure_member(&room.id, "bob").await.unwrap();
    }

    #[tokio::test]
    async fn test_admin_leave_keeps_room_non_empty() {
        let (rooms, _hub) = setup(&["alice", "bob"]).await;
        let room = rooms.create_room("general", "", "alice").await.unwrap();
        rooms.join_room(&room.id, "bob").await.unwrap();

        let after = rooms.leave_room(&room.id, "alice").await.unwrap().unwrap();
        assert_eq!(after.admin_id, "bob");
        assert_eq!(after.members, vec!["bob".to_string()]);
        assert_eq!(rooms.list_rooms_for_user("alice").await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_room_deletion_closes_live_streams() {
        let (rooms, hub) = setup(&["alice"]).await;
        let room = rooms.create_room("general", "", "alice").await.unwrap();
        let mut sub = hub.subscribe(&room.id, "alice");

        rooms.leave_room(&room.id, "alice").await.unwrap();
        assert!(matches!(sub.next().await, Some(LiveEvent::RoomClosed { .. })));
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn test_create_room_validation() {
        let (rooms, _hub) = setup(&["alice"]).await;
        assert!(matches!(
            rooms.create_room("   ", "", "alice").await,
            Err(CoreError::InvalidInput(_))
        ));
        rooms.db.set_user_active("alice", false).await.unwrap();
        assert!(matches!(
            rooms.create_room("general", "", "alice").await,
            Err(CoreError::AccountDeactivated)
        ));
    }
}
