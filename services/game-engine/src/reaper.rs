//! Abandonment reaper
//!
//! A single periodic sweep over persisted matches: any Open match with no
//! joiner whose creation time has passed the abandonment threshold is
//! force-closed and its subscribers notified. The sweep is driven purely by
//! persisted `created_at`, so a restart loses nothing and no per-match
//! timers accumulate.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::engine::MatchEngine;

/// Sweep cadence and abandonment threshold. Configuration, not behavior.
#[derive(Debug, Clone)]
pub struct ReaperConfig {
    /// Time between sweeps
    pub interval: Duration,
    /// Age past which an unjoined Open match is abandoned
    pub abandonment_threshold: Duration,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            abandonment_threshold: Duration::from_secs(3 * 60),
        }
    }
}

/// Periodic abandonment sweep over the match store
pub struct Reaper {
    engine: Arc<MatchEngine>,
    config: ReaperConfig,
}

/// Handle for stopping a running reaper
pub struct ReaperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ReaperHandle {
    /// Graceful shutdown: no new ticks are accepted, the in-flight sweep
    /// finishes, then the task exits.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

impl Reaper {
    pub fn new(engine: Arc<MatchEngine>, config: ReaperConfig) -> Self {
        Self { engine, config }
    }

    /// Start the sweep loop on the runtime
    pub fn spawn(self) -> ReaperHandle {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let threshold = chrono::Duration::from_std(self.config.abandonment_threshold)
            .unwrap_or_else(|_| chrono::Duration::minutes(3));

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.interval);
            // interval fires immediately; run the first sweep right away,
            // matching a fresh process catching up on stale matches
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match self.engine.close_abandoned(threshold).await {
                            Ok(0) => {}
                            Ok(closed) => info!(closed, "reaper closed abandoned matches"),
                            Err(e) => error!(error = %e, "reaper sweep failed"),
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        info!("reaper stopped");
                        break;
                    }
                }
            }
        });

        ReaperHandle { shutdown, task }
    }
}
