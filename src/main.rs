//! OpenSASE Shop - catalog, cart and checkout service

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use opensase_shop::api::{self, AppState};
use opensase_shop::config::Config;
use opensase_shop::db;
use opensase_shop::events::EventPublisher;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    tracing::debug!(?config, "configuration loaded");

    let pool = db::create_pool(&config).await?;
    db::MIGRATOR.run(&pool).await?;
    let events = EventPublisher::connect(config.nats_url.as_deref()).await;
    let app = api::router(AppState { db: pool, events });

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "OpenSASE Shop listening");
    axum::serve(listener, app).await?;
    Ok(())
}
