use anyhow::Result;
use async_trait::async_trait;
use domain::NotifyCommand;
use tracing::info;

use crate::traits::NotifierDriver;

/// Writes notices to the log. Used when no mail relay is configured.
pub struct LogDriver;

#[async_trait]
impl NotifierDriver for LogDriver {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn deliver(&self, cmd: &NotifyCommand) -> Result<()> {
        match cmd {
            NotifyCommand::CommentRemoval { user_id } => {
                info!(user_id = %user_id, "notice: comment moderated");
            }
            NotifyCommand::AccountReview { user_id, warnings } => {
                info!(user_id = %user_id, warnings, "notice: account needs admin review");
            }
        }
        Ok(())
    }
}
