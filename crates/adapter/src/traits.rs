use anyhow::Result;
use async_trait::async_trait;
use domain::NotifyCommand;

/// Out-of-band delivery channel for moderation notices (mail relay, log, ...).
#[async_trait]
pub trait NotifierDriver: Send + Sync {
    fn name(&self) -> &'static str;

    async fn deliver(&self, cmd: &NotifyCommand) -> Result<()>;
}
