mod drivers;
mod traits;

pub use drivers::webhook::WebhookConfig;
pub use drivers::{LogDriver, WebhookDriver};
pub use traits::NotifierDriver;

use domain::NotifyCommand;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub enum NotifierConfig {
    Log,
    Webhook(WebhookConfig),
}

/// Sending half handed to the moderation pipeline.
///
/// `dispatch` never waits: if the worker is behind or gone the notice is
/// dropped and logged, and the caller carries on.
#[derive(Clone)]
pub struct NotificationQueue {
    tx: mpsc::Sender<NotifyCommand>,
}

impl NotificationQueue {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<NotifyCommand>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    pub fn dispatch(&self, cmd: NotifyCommand) {
        match self.tx.try_send(cmd) {
            Ok(()) => debug!("Notice queued"),
            Err(TrySendError::Full(cmd)) => {
                warn!(user_id = %cmd.user_id(), "Notifier queue full, dropping notice: {:?}", cmd);
            }
            Err(TrySendError::Closed(cmd)) => {
                warn!(
                    user_id = %cmd.user_id(),
                    "Notifier worker stopped, dropping notice: {:?}",
                    cmd
                );
            }
        }
    }
}

pub fn build_driver(config: NotifierConfig) -> anyhow::Result<Arc<dyn NotifierDriver>> {
    let driver: Arc<dyn NotifierDriver> = match config {
        NotifierConfig::Log => {
            info!("Initializing notifier in LOG mode...");
            Arc::new(LogDriver)
        }
        NotifierConfig::Webhook(conf) => {
            info!("Initializing notifier in WEBHOOK mode -> {}", conf.url);
            Arc::new(WebhookDriver::new(conf)?)
        }
    };
    Ok(driver)
}

/// Drains the queue until it closes or `cancel_token` fires. Delivery
/// failures are logged and never retried.
pub async fn start_with_cancel_token(
    driver: Arc<dyn NotifierDriver>,
    mut rx: mpsc::Receiver<NotifyCommand>,
    cancel_token: CancellationToken,
) {
    info!("Notifier worker started ({})", driver.name());
    loop {
        tokio::select! {
            cmd_opt = rx.recv() => {
                let cmd = match cmd_opt {
                    Some(c) => c,
                    None => break,
                };
                if let Err(e) = driver.deliver(&cmd).await {
                    error!("Notice delivery via {} failed: {:?}", driver.name(), e);
                }
            },
            _ = cancel_token.cancelled() => break,
        }
    }
    info!("Notifier worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        seen: Mutex<Vec<NotifyCommand>>,
        fail_first: bool,
    }

    #[async_trait]
    impl NotifierDriver for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn deliver(&self, cmd: &NotifyCommand) -> anyhow::Result<()> {
            let mut seen = self.seen.lock().unwrap();
            seen.push(cmd.clone());
            if self.fail_first && seen.len() == 1 {
                anyhow::bail!("relay down");
            }
            Ok(())
        }
    }

    fn removal(user: &str) -> NotifyCommand {
        NotifyCommand::CommentRemoval {
            user_id: user.into(),
        }
    }

    #[test]
    fn test_dispatch_never_blocks_when_full() {
        let (queue, mut rx) = NotificationQueue::new(1);
        queue.dispatch(removal("a"));
        queue.dispatch(removal("b"));

        assert_eq!(rx.try_recv().unwrap(), removal("a"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dispatch_after_worker_gone_is_dropped() {
        let (queue, rx) = NotificationQueue::new(4);
        drop(rx);
        queue.dispatch(removal("a"));
    }

    #[tokio::test]
    async fn test_worker_survives_delivery_failure() {
        let driver = Arc::new(Recording {
            fail_first: true,
            ..Default::default()
        });
        let (queue, rx) = NotificationQueue::new(8);
        queue.dispatch(removal("a"));
        queue.dispatch(NotifyCommand::AccountReview {
            user_id: "a".into(),
            warnings: 3,
        });
        drop(queue);

        start_with_cancel_token(driver.clone(), rx, CancellationToken::new()).await;

        let seen = driver.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(matches!(seen[1], NotifyCommand::AccountReview { warnings: 3, .. }));
    }

    #[tokio::test]
    async fn test_worker_stops_on_cancel() {
        let driver = Arc::new(Recording::default());
        let (_queue, rx) = NotificationQueue::new(8);
        let token = CancellationToken::new();
        let handle = tokio::spawn(start_with_cancel_token(driver, rx, token.clone()));

        token.cancel();
        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .expect("worker should stop")
            .unwrap();
    }
}
