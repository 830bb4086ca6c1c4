use chrono::Utc;
use domain::{CoreError, HistoryPage, LiveEvent, Message};
use storage::Db;
use tracing::{debug, info};

use crate::live::{RoomHub, Subscription};

const MAX_MESSAGE_CHARS: usize = 4_000;
pub const MAX_HISTORY_PAGE: i64 = 200;

/// Persists chat messages and fans them out to live subscribers.
///
/// Sending does not check membership; callers verify it through `Rooms`.
#[derive(Clone)]
pub struct Relay {
    db: Db,
    hub: RoomHub,
}

impl Relay {
    pub fn new(db: Db, hub: RoomHub) -> Self {
        Self { db, hub }
    }

    /// The message is stored before it is broadcast, so anyone who sees the
    /// live event can also find it in history.
    pub async fn send_message(
        &self,
        room_id: &str,
        author_id: &str,
        text: &str,
    ) -> Result<Message, CoreError> {
        if text.trim().is_empty() {
            return Err(CoreError::InvalidMessage("message text is empty"));
        }
        if text.chars().count() > MAX_MESSAGE_CHARS {
            return Err(CoreError::InvalidMessage("message text is too long"));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let message = self
            .db
            .insert_message(&id, room_id, author_id, text, Utc::now().naive_utc())
            .await?
            .ok_or_else(|| CoreError::not_found("room", room_id))?;

        let reached = self.hub.publish(LiveEvent::MessagePosted {
            room_id: room_id.to_string(),
            message: message.clone(),
        });
        info!(room_id, message_id = %message.id, reached, "Message relayed");
        Ok(message)
    }

    /// Only members may listen. The subscription is taken before the checks
    /// so a concurrent leave or room deletion still reaches it.
    pub async fn subscribe(
        &self,
        room_id: &str,
        user_id: &str,
    ) -> Result<Subscription, CoreError> {
        let subscription = self.hub.subscribe(room_id, user_id);
        if !self.db.is_room_member(room_id, user_id).await? {
            drop(subscription);
            if self.db.get_room(room_id).await?.is_none() {
                return Err(CoreError::not_found("room", room_id));
            }
            return Err(CoreError::NotMember);
        }
        debug!(
            room_id,
            user_id,
            listeners = self.hub.subscriber_count(room_id),
            "Live subscription opened"
        );
        Ok(subscription)
    }

    /// A page of persisted messages, oldest first, ending just before `before`.
    pub async fn history(
        &self,
        room_id: &str,
        before: Option<i64>,
        limit: i64,
    ) -> Result<HistoryPage, CoreError> {
        if self.db.get_room(room_id).await?.is_none() {
            return Err(CoreError::not_found("room", room_id));
        }
        let limit = limit.clamp(1, MAX_HISTORY_PAGE);
        let messages = self.db.list_messages(room_id, before, limit).await?;
        let next_cursor = if messages.len() as i64 == limit {
            messages.first().map(|m| m.seq)
        } else {
            None
        };
        debug!(room_id, count = messages.len(), "History page served");
        Ok(HistoryPage {
            messages,
            next_cursor,
        })
    }
}
