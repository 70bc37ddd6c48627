//! Match state machine
//!
//! Main coordinator for match lifecycle operations. Every state-changing
//! operation follows the same shape: take the per-match lock, read the
//! aggregate, validate against the state machine, mutate, persist the whole
//! aggregate with a versioned write, then publish the domain event. Events
//! are only ever published after a successful persist, so subscribers see
//! per-match events in state order.

use std::sync::Arc;

use chrono::{Duration, Utc};
use dashmap::DashMap;
use event_broker::{EventBroker, EventKind};
use serde::Serialize;
use serde_json::{json, Map};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use types::board::{in_bounds, Board};
use types::errors::GameError;
use types::game::{Match, MatchState, MatchSummary};
use types::ids::{MatchId, PlayerId};

use crate::placement;
use crate::stats::StatsSink;
use crate::store::{MatchStore, StoreError};

/// Result of applying one shot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShotOutcome {
    pub hit: bool,
    pub game_over: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<PlayerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_turn: Option<PlayerId>,
}

/// What a caller sees when fetching one match
///
/// Callers with an identity get the full aggregate; anonymous callers get
/// the reduced public view with boards omitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MatchView {
    Full(Box<Match>),
    Public(MatchSummary),
}

/// Matches grouped by state for the listing endpoint.
/// Closed matches are omitted; they remain fetchable by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchListing {
    pub open: Vec<MatchSummary>,
    pub active: Vec<MatchSummary>,
    pub completed: Vec<MatchSummary>,
}

/// The match engine: owns the state machine, delegates persistence to the
/// store and event delivery to the broker.
pub struct MatchEngine {
    store: Arc<dyn MatchStore>,
    broker: Arc<EventBroker>,
    stats: Arc<dyn StatsSink>,
    /// Per-match-id mutual exclusion around read-validate-mutate-persist
    locks: DashMap<MatchId, Arc<Mutex<()>>>,
}

impl MatchEngine {
    pub fn new(store: Arc<dyn MatchStore>, broker: Arc<EventBroker>, stats: Arc<dyn StatsSink>) -> Self {
        Self { store, broker, stats, locks: DashMap::new() }
    }

    /// Create a new Open match with a freshly generated creator fleet
    pub async fn create_match(&self, creator: PlayerId) -> Result<Match, GameError> {
        let fleet = placement::generate_fleet(&mut rand::thread_rng())
            .map_err(|e| GameError::Internal(e.to_string()))?;
        let game = Match::new(MatchId::new(), creator, Board::with_fleet(fleet), Utc::now());

        self.store.insert(game.clone()).await.map_err(store_error)?;
        info!(match_id = %game.id, %creator, "match created");
        Ok(game)
    }

    /// Join an Open match as the second player
    ///
    /// Both fleets are regenerated fresh at join time; the Open state
    /// guarantees no shots exist yet, so nothing is lost. The creator
    /// always holds the first turn.
    pub async fn join_match(&self, id: MatchId, joiner: PlayerId) -> Result<Match, GameError> {
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        let mut game = self.read(&id).await?;
        if game.state != MatchState::Open {
            return Err(GameError::state("game not open for joining"));
        }
        if game.creator == joiner {
            return Err(GameError::Conflict("cannot join your own match".to_string()));
        }

        // ThreadRng is !Send; keep it out of scope before the awaits below
        let (creator_fleet, joiner_fleet) = {
            let mut rng = rand::thread_rng();
            (
                placement::generate_fleet(&mut rng).map_err(|e| GameError::Internal(e.to_string()))?,
                placement::generate_fleet(&mut rng).map_err(|e| GameError::Internal(e.to_string()))?,
            )
        };

        game.joiner = Some(joiner);
        game.state = MatchState::Active;
        game.turn_holder = Some(game.creator);
        game.creator_board = Board::with_fleet(creator_fleet);
        game.joiner_board = Board::with_fleet(joiner_fleet);

        let game = self.store.update(game).await.map_err(store_error)?;
        info!(match_id = %id, %joiner, "player joined, match active");

        self.broker.publish(id, EventKind::PlayerJoined, Map::new());
        Ok(game)
    }

    /// Apply one shot from `actor` at (row, col)
    ///
    /// A miss flips the turn; a non-terminal hit keeps it (the shooter
    /// fires again until a miss or the match ends — intended behavior).
    /// The terminal hit completes the match and requests a best-effort
    /// stats increment for both identities.
    pub async fn apply_shot(
        &self,
        id: MatchId,
        actor: PlayerId,
        row: u8,
        col: u8,
    ) -> Result<ShotOutcome, GameError> {
        if !in_bounds(row, col) {
            return Err(GameError::Validation(format!("coordinates ({row}, {col}) out of range")));
        }

        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        let mut game = self.read(&id).await?;
        if game.state != MatchState::Active {
            return Err(GameError::state("game not active"));
        }
        if game.turn_holder != Some(actor) {
            return Err(GameError::not_your_turn(game.turn_holder));
        }

        let actor_is_creator = game.creator == actor;
        let opponent = game
            .opponent_of(&actor)
            .ok_or_else(|| GameError::state("opponent seat is empty"))?;

        {
            let own_board = if actor_is_creator { &game.creator_board } else { &game.joiner_board };
            if own_board.has_shot_at(row, col) {
                return Err(GameError::Validation("already shot".to_string()));
            }
        }

        // Resolve against the opponent fleet: first unhit ship cell wins
        let opponent_board =
            if actor_is_creator { &mut game.joiner_board } else { &mut game.creator_board };
        let mut hit = false;
        for ship in &mut opponent_board.ships {
            if let Some(cell) = ship.cell_at_mut(row, col) {
                if !cell.hit {
                    cell.hit = true;
                    hit = true;
                    break;
                }
            }
        }
        let all_sunk = hit && opponent_board.all_ships_sunk();

        let own_board = if actor_is_creator { &mut game.creator_board } else { &mut game.joiner_board };
        own_board.shots.push(types::board::Shot { row, col, hit });
        game.last_shot_was_hit = Some(hit);

        if all_sunk {
            game.state = MatchState::Completed;
            game.winner = Some(actor);
            game.ended_at = Some(Utc::now());
            game.turn_holder = None;
        } else if !hit {
            game.turn_holder = Some(opponent);
        }

        let game = self.store.update(game).await.map_err(store_error)?;
        debug!(match_id = %id, %actor, row, col, hit, game_over = all_sunk, "shot applied");

        if all_sunk {
            // Statistics may lag truth; they never block game progression
            if let Err(e) = self.stats.record_result(actor, opponent).await {
                warn!(match_id = %id, error = %e, "stats increment failed");
            }
            info!(match_id = %id, winner = %actor, "match completed");
        }

        let payload = if all_sunk {
            let mut map = Map::new();
            map.insert("gameOver".to_string(), json!(true));
            map.insert("winner".to_string(), json!(actor));
            map
        } else {
            Map::new()
        };
        let kind = if hit { EventKind::Hit } else { EventKind::Miss };
        self.broker.publish(id, kind, payload);

        if all_sunk {
            self.release_lock(&id);
        }

        Ok(ShotOutcome {
            hit,
            game_over: all_sunk,
            winner: game.winner,
            next_turn: game.turn_holder,
        })
    }

    /// Fetch one match: the full aggregate for identified callers, the
    /// public view for anonymous ones
    pub async fn get_match(&self, id: MatchId, caller: Option<PlayerId>) -> Result<MatchView, GameError> {
        let game = self.read(&id).await?;
        Ok(match caller {
            Some(_) => MatchView::Full(Box::new(game)),
            None => MatchView::Public(game.summary()),
        })
    }

    /// All matches grouped by state (Closed omitted)
    pub async fn list_matches(&self) -> Result<MatchListing, GameError> {
        let mut listing = MatchListing::default();
        for game in self.store.list().await.map_err(store_error)? {
            let summary = game.summary();
            match game.state {
                MatchState::Open => listing.open.push(summary),
                MatchState::Active => listing.active.push(summary),
                MatchState::Completed => listing.completed.push(summary),
                MatchState::Closed => {}
            }
        }
        Ok(listing)
    }

    /// Force-close Open matches nobody joined within `threshold`.
    ///
    /// The sweep primitive behind the reaper. Idempotent: each candidate is
    /// re-checked under its match lock, so an already-transitioned match is
    /// skipped.
    pub async fn close_abandoned(&self, threshold: Duration) -> Result<usize, GameError> {
        let cutoff = Utc::now() - threshold;
        let candidates = self.store.stale_open_matches(cutoff).await.map_err(store_error)?;

        let mut closed = 0;
        for candidate in candidates {
            let lock = self.lock_for(candidate.id);
            let _guard = lock.lock().await;

            // A join may have raced the sweep; re-read and re-check
            let Some(mut game) = self.store.get(&candidate.id).await.map_err(store_error)? else {
                continue;
            };
            if game.state != MatchState::Open || game.joiner.is_some() || game.created_at >= cutoff {
                continue;
            }

            game.state = MatchState::Closed;
            game.ended_at = Some(Utc::now());
            self.store.update(game).await.map_err(store_error)?;
            info!(match_id = %candidate.id, "abandoned match closed");

            self.broker.publish(candidate.id, EventKind::Closed, Map::new());
            self.release_lock(&candidate.id);
            closed += 1;
        }
        Ok(closed)
    }

    async fn read(&self, id: &MatchId) -> Result<Match, GameError> {
        self.store
            .get(id)
            .await
            .map_err(store_error)?
            .ok_or_else(|| GameError::NotFound(format!("match {id}")))
    }

    fn lock_for(&self, id: MatchId) -> Arc<Mutex<()>> {
        self.locks.entry(id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    /// Drop the lock entry for a match that reached a terminal state.
    ///
    /// Waiters already holding the `Arc` proceed against the old mutex; a
    /// late caller that recreates the entry still re-reads the aggregate
    /// under its lock, and terminal states are absorbing, so the lock table
    /// stays proportional to live matches without weakening any check.
    fn release_lock(&self, id: &MatchId) {
        self.locks.remove(id);
    }
}

fn store_error(err: StoreError) -> GameError {
    match err {
        StoreError::NotFound(id) => GameError::NotFound(format!("match {id}")),
        StoreError::VersionConflict { id, .. } => {
            GameError::Conflict(format!("match {id} was updated concurrently, retry"))
        }
        other => GameError::Internal(other.to_string()),
    }
}
