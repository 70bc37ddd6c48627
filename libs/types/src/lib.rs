//! Types library for the naval battle match service
//!
//! Shared type definitions used across the engine, broker, and gateway
//! services.
//!
//! # Modules
//! - `ids`: Unique identifiers (MatchId, PlayerId, ClientId)
//! - `board`: Grid geometry, ships, shots, and board invariant helpers
//! - `game`: The Match aggregate and its state machine types
//! - `errors`: Error taxonomy

pub mod board;
pub mod errors;
pub mod game;
pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::board::*;
    pub use crate::errors::*;
    pub use crate::game::*;
    pub use crate::ids::*;
}
