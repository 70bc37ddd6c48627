//! Game Engine Service
//!
//! Owns the match state machine and everything that mutates it:
//! - `placement`: randomized, non-overlapping fleet generation
//! - `store`: the key-value aggregate store seam (versioned writes)
//! - `engine`: create/join/shoot operations and views
//! - `stats`: best-effort win/loss accounting collaborator
//! - `reaper`: the periodic sweep that force-closes unjoined stale matches
//!
//! **Key invariants:**
//! - All mutations of one match id are serialized by a per-match lock;
//!   the store's versioned write rejects any writer that slipped past it.
//! - A failed operation leaves the aggregate untouched; events are only
//!   published after a successful persist.
//! - State transitions are monotonic: Open→Active→Completed or Open→Closed.

pub mod engine;
pub mod placement;
pub mod reaper;
pub mod stats;
pub mod store;

pub use engine::{MatchEngine, MatchListing, MatchView, ShotOutcome};
pub use reaper::{Reaper, ReaperConfig, ReaperHandle};
pub use store::{MatchStore, MemoryStore, StoreError};
