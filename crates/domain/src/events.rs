use crate::models::Message;
use serde::{Deserialize, Serialize};

/// Events fanned out to live room subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveEvent {
    MessagePosted { room_id: String, message: Message },
    RoomClosed { room_id: String },
}

impl LiveEvent {
    pub fn room_id(&self) -> &str {
        match self {
            LiveEvent::MessagePosted { room_id, .. } => room_id,
            LiveEvent::RoomClosed { room_id } => room_id,
        }
    }
}
