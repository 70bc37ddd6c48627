mod auth;
mod error;
mod handlers;
mod models;
mod router;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use event_broker::{BrokerConfig, EventBroker};
use game_engine::stats::NullStats;
use game_engine::{MatchEngine, MemoryStore, Reaper, ReaperConfig};
use router::create_router;
use state::AppState;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt::init();

    tracing::info!("Starting match service gateway");

    let broker = Arc::new(EventBroker::new(BrokerConfig::default()));
    let engine = Arc::new(MatchEngine::new(
        Arc::new(MemoryStore::new()),
        broker.clone(),
        Arc::new(NullStats),
    ));

    let keepalive = broker.start();
    let reaper = Reaper::new(engine.clone(), ReaperConfig::default()).spawn();

    let app = create_router(AppState::new(engine, broker.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], 8080));
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    reaper.shutdown().await;
    broker.stop();
    let _ = keepalive.await;

    Ok(())
}
