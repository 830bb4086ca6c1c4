pub mod log;
pub mod webhook;

pub use self::log::LogDriver;
pub use self::webhook::WebhookDriver;
