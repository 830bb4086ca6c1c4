pub mod moderation;
pub mod relay;
pub mod rooms;

pub use moderation::Moderation;
pub use relay::Relay;
pub use rooms::Rooms;

use domain::CoreError;
use storage::Db;

/// Rejects unknown and deactivated accounts before any write.
pub(crate) async fn ensure_active(db: &Db, user_id: &str) -> Result<(), CoreError> {
    match db.is_user_active(user_id).await? {
        None => Err(CoreError::not_found("user", user_id)),
        Some(false) => Err(CoreError::AccountDeactivated),
        Some(true) => Ok(()),
    }
}
