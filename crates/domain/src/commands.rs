use serde::{Deserialize, Serialize};

/// Work handed to the notifier worker. Dispatch never blocks the request path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyCommand {
    /// Tell the author one of their comments was moderated.
    CommentRemoval { user_id: String },
    /// Ask administrators to review an account whose warnings crossed a threshold.
    AccountReview { user_id: String, warnings: i64 },
}

impl NotifyCommand {
    pub fn user_id(&self) -> &str {
        match self {
            NotifyCommand::CommentRemoval { user_id } => user_id,
            NotifyCommand::AccountReview { user_id, .. } => user_id,
        }
    }
}
