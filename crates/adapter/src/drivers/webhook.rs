use anyhow::{Context, Result};
use async_trait::async_trait;
use domain::{protocol, NotifyCommand};
use std::time::Duration;

use crate::traits::NotifierDriver;

#[derive(Clone)]
pub struct WebhookConfig {
    pub url: String,
    pub timeout: Duration,
}

/// Posts each notice as JSON to an external mail relay.
pub struct WebhookDriver {
    config: WebhookConfig,
    client: reqwest::Client,
}

impl WebhookDriver {
    pub fn new(config: WebhookConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build webhook HTTP client")?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl NotifierDriver for WebhookDriver {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn deliver(&self, cmd: &NotifyCommand) -> Result<()> {
        let body = protocol::build_outbound_notice(cmd);
        self.client
            .post(&self.config.url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("POST {} failed", self.config.url))?
            .error_for_status()
            .context("Mail relay rejected notice")?;
        Ok(())
    }
}
