use config::ConfigError;
use domain::MaskCase;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const ENV_PREFIX: &str = "PARLEY_";

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub moderation: ModerationSettings,
    pub security: SecuritySettings,
    pub notifier: NotifierSettings,
    pub relay: RelaySettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: String,
}

#[derive(Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Deserialize, Clone)]
pub struct ModerationSettings {
    /// Word list used to seed an empty dictionary.
    pub slang_list_path: Option<String>,
    pub mask_case: MaskCase,
    pub escalation_interval: i64,
}

#[derive(Deserialize, Clone)]
pub struct SecuritySettings {
    pub token_secret: String,
    pub admin_token: String,
}

#[derive(Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum NotifierMode {
    Log,
    Webhook,
}

#[derive(Deserialize, Clone)]
pub struct NotifierSettings {
    pub mode: NotifierMode,
    pub webhook_url: Option<String>,
    pub timeout_secs: u64,
    pub queue_capacity: usize,
}

#[derive(Deserialize, Clone)]
pub struct RelaySettings {
    pub channel_capacity: usize,
    pub history_page_size: i64,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());
        Self::load(&run_mode, collect_env_vars())
    }

    fn load(
        run_mode: &str,
        env_map: HashMap<String, serde_json::Value>,
    ) -> Result<Self, ConfigError> {
        let s = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.cors_origins", "*")?
            .set_default("database.url", "sqlite://data/parley.db")?
            .set_default("moderation.slang_list_path", "data/slang.txt")?
            .set_default("moderation.mask_case", "lower")?
            .set_default("moderation.escalation_interval", 3)?
            .set_default("security.token_secret", "change_me_please")?
            .set_default("security.admin_token", "admin_secret_123")?
            .set_default("notifier.mode", "log")?
            .set_default("notifier.timeout_secs", 10)?
            .set_default("notifier.queue_capacity", 256)?
            .set_default("relay.channel_capacity", 128)?
            .set_default("relay.history_page_size", 50)?
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::File::with_name(&format!("config.{}", run_mode)).required(false))
            .add_source(config::File::from_str(
                &serde_json::to_string(&env_map)
                    .map_err(|e| ConfigError::Message(e.to_string()))?,
                config::FileFormat::Json,
            ))
            .build()?;

        s.try_deserialize()
    }
}

impl NotifierSettings {
    pub fn to_driver_config(&self) -> anyhow::Result<adapter::NotifierConfig> {
        match self.mode {
            NotifierMode::Log => Ok(adapter::NotifierConfig::Log),
            NotifierMode::Webhook => {
                let url = self
                    .webhook_url
                    .clone()
                    .filter(|u| !u.is_empty())
                    .ok_or_else(|| {
                        anyhow::anyhow!("notifier.webhook_url is required in webhook mode")
                    })?;
                Ok(adapter::NotifierConfig::Webhook(adapter::WebhookConfig {
                    url,
                    timeout: Duration::from_secs(self.timeout_secs),
                }))
            }
        }
    }
}

// PARLEY_SERVER__PORT=8080 -> { "server": { "port": "8080" } }
fn collect_env_vars() -> HashMap<String, serde_json::Value> {
    let mut root: HashMap<String, serde_json::Value> = HashMap::new();
    for (k, v) in std::env::vars().filter(|(k, _)| k.starts_with(ENV_PREFIX)) {
        let key = k.trim_start_matches(ENV_PREFIX).to_lowercase();
        match key.split_once("__") {
            Some((section, field)) => {
                let entry = root
                    .entry(section.to_string())
                    .or_insert_with(|| serde_json::json!({}));
                if let Some(obj) = entry.as_object_mut() {
                    obj.insert(field.to_string(), serde_json::Value::String(v));
                }
            }
            None => {
                root.insert(key, serde_json::Value::String(v));
            }
        }
    }
    root
}
