mod config;
mod xmpp;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use standup_api::AppState;
use standup_core::scheduler::{TICK_SECS, first_tick_delay};
use standup_core::{ChannelHandle, Service, ServiceConfig};
use standup_db::Database;
use standup_types::events::ChannelEvent;
use standup_types::models::ContactId;

use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "standup=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let db = Database::open(&config.db_path)
        .with_context(|| format!("opening database at {}", config.db_path.display()))?;

    // Load directory first: a failure here must terminate before the
    // channel or the read surface come up.
    let (channel, outbound_rx) = ChannelHandle::new();
    let mut service = Service::load(
        db.clone(),
        channel,
        ServiceConfig {
            own_id: ContactId::new(&config.jid),
            base_url: config.base_url.clone(),
            admission: config.admission,
            store_errors: config.store_errors,
        },
    )
    .await
    .context("loading contact directory")?;
    info!("serving as {}", config.jid);

    // Channel adapter.
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let client = xmpp::connect(&config.jid, &config.password)?;
    tokio::spawn(xmpp::run(client, events_tx, outbound_rx));

    // Scheduler tick, aligned to wall-clock interval boundaries.
    let mut ticker = time::interval_at(
        Instant::now() + first_tick_delay(Utc::now().timestamp()),
        std::time::Duration::from_secs(TICK_SECS as u64),
    );

    // HTTP read surface.
    let app = standup_api::router(AppState { db })
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());
    let listener = TcpListener::bind(config.http_addr)
        .await
        .with_context(|| format!("binding {}", config.http_addr))?;
    info!("http read surface on {}", config.http_addr);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("http server exited: {}", e);
        }
    });

    // All state changes happen on this one loop.
    loop {
        tokio::select! {
            event = events_rx.recv() => match event {
                Some(ChannelEvent::Disconnected) | None => {
                    info!("channel closed, shutting down");
                    break;
                }
                Some(event) => {
                    service.handle_event(event, Utc::now().timestamp()).await?;
                }
            },
            _ = ticker.tick() => {
                service.on_tick(Utc::now().timestamp()).await;
            }
        }
    }

    Ok(())
}
