//! Win/loss accounting collaborator
//!
//! A completed match asks the account service for one win increment and one
//! loss increment. The call is best-effort: statistics may lag truth, they
//! never block or revert game progression.

use async_trait::async_trait;
use tracing::info;
use types::ids::PlayerId;

/// External account-statistics seam
#[async_trait]
pub trait StatsSink: Send + Sync {
    /// Record one match result: a single increment per identity
    async fn record_result(&self, winner: PlayerId, loser: PlayerId) -> Result<(), String>;
}

/// Sink used while no account service is wired in
pub struct NullStats;

#[async_trait]
impl StatsSink for NullStats {
    async fn record_result(&self, winner: PlayerId, loser: PlayerId) -> Result<(), String> {
        info!(%winner, %loser, "match result recorded (no stats backend)");
        Ok(())
    }
}
