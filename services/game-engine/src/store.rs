//! Key-value aggregate store seam
//!
//! The engine reads and writes whole `Match` aggregates; both boards always
//! travel with the record, so a join or shot can never leave one board
//! half-written. Updates are conditional on the aggregate's revision: a
//! writer holding a stale revision is rejected with `VersionConflict`
//! instead of silently overwriting a concurrent change.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use thiserror::Error;
use types::game::{Match, MatchState};
use types::ids::MatchId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("match not found: {0}")]
    NotFound(MatchId),

    #[error("match already exists: {0}")]
    AlreadyExists(MatchId),

    /// The stored revision moved since the caller's read; retryable
    #[error("version conflict on match {id}: expected {expected}, stored {stored}")]
    VersionConflict { id: MatchId, expected: u64, stored: u64 },

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Persistence collaborator for `Match` aggregates
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Insert a new aggregate; fails if the id already exists
    async fn insert(&self, game: Match) -> Result<(), StoreError>;

    /// Fetch an aggregate by id
    async fn get(&self, id: &MatchId) -> Result<Option<Match>, StoreError>;

    /// Conditional write: succeeds only if the stored revision equals
    /// `game.version`, then stores the aggregate with the revision bumped
    async fn update(&self, game: Match) -> Result<Match, StoreError>;

    /// Every persisted aggregate
    async fn list(&self) -> Result<Vec<Match>, StoreError>;

    /// Open matches with no joiner created before `cutoff` — the
    /// abandonment sweep predicate
    async fn stale_open_matches(&self, cutoff: DateTime<Utc>) -> Result<Vec<Match>, StoreError>;
}

/// In-memory store used by the binary and by tests
#[derive(Default)]
pub struct MemoryStore {
    matches: DashMap<MatchId, Match>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MatchStore for MemoryStore {
    async fn insert(&self, game: Match) -> Result<(), StoreError> {
        match self.matches.entry(game.id) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(StoreError::AlreadyExists(game.id)),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(game);
                Ok(())
            }
        }
    }

    async fn get(&self, id: &MatchId) -> Result<Option<Match>, StoreError> {
        Ok(self.matches.get(id).map(|entry| entry.clone()))
    }

    async fn update(&self, mut game: Match) -> Result<Match, StoreError> {
        // The entry guard makes compare-and-bump atomic per id
        let mut entry = self
            .matches
            .get_mut(&game.id)
            .ok_or(StoreError::NotFound(game.id))?;
        if entry.version != game.version {
            return Err(StoreError::VersionConflict {
                id: game.id,
                expected: game.version,
                stored: entry.version,
            });
        }
        game.version += 1;
        *entry = game.clone();
        Ok(game)
    }

    async fn list(&self) -> Result<Vec<Match>, StoreError> {
        let mut all: Vec<Match> = self.matches.iter().map(|entry| entry.clone()).collect();
        // UUID v7 ids sort by creation time
        all.sort_by_key(|m| *m.id.as_uuid());
        Ok(all)
    }

    async fn stale_open_matches(&self, cutoff: DateTime<Utc>) -> Result<Vec<Match>, StoreError> {
        Ok(self
            .matches
            .iter()
            .filter(|m| m.state == MatchState::Open && m.joiner.is_none() && m.created_at < cutoff)
            .map(|entry| entry.clone())
            .collect())
    }
}
