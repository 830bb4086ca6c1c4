mod auth;
mod config;
mod error;
mod http;
mod live;
mod services;
mod state;

use anyhow::Context;
use dotenvy::dotenv;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use adapter::NotificationQueue;
use config::Settings;
use domain::SlangFilter;
use http::router::build_router;
use live::RoomHub;
use services::{Moderation, Relay, Rooms};
use state::AppState;
use storage::Db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::new().context("Failed to load configuration")?;

    let db = Db::new(&settings.database.url).await?;

    let (notifier, rx_notice) = NotificationQueue::new(settings.notifier.queue_capacity);
    let driver = adapter::build_driver(settings.notifier.to_driver_config()?)?;
    let cancel_token = CancellationToken::new();

    let worker_token = cancel_token.clone();
    let worker = tokio::spawn(async move {
        adapter::start_with_cancel_token(driver, rx_notice, worker_token).await;
    });

    let filter = Arc::new(SlangFilter::new(settings.moderation.mask_case));
    let moderation = Moderation::new(
        db.clone(),
        filter,
        notifier,
        settings.moderation.escalation_interval,
    );
    let word_count = moderation
        .load_dictionary(settings.moderation.slang_list_path.as_deref().map(Path::new))
        .await
        .context("Failed to load slang dictionary")?;
    info!("Slang filter ready with {} words", word_count);

    let hub = RoomHub::new(settings.relay.channel_capacity);

    let state = AppState {
        db: db.clone(),
        moderation,
        rooms: Rooms::new(db.clone(), hub.clone()),
        relay: Relay::new(db, hub),
        signer: auth::TokenSigner::new(&settings.security.token_secret),
        admin_token: Arc::from(settings.security.admin_token.as_str()),
        history_page_size: settings.relay.history_page_size,
    };

    let app = build_router(state, &settings.server.cors_origins);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address: {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cancel_token.cancel();
    if let Err(e) = worker.await {
        tracing::error!("Notifier worker crashed: {:?}", e);
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}
