//! The Match aggregate and its state machine types
//!
//! A match is one game session between two identities. It is the unit of
//! persistence: both boards are always written together with the match
//! record, and a revision counter guards against concurrent writers.

use crate::board::Board;
use crate::ids::{MatchId, PlayerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Match lifecycle states
///
/// Transitions are monotonic: Open→Active→Completed, or Open→Closed.
/// No other edges exist and no edge is ever reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchState {
    /// Created, waiting for a second player
    Open,
    /// Both players present, shots being exchanged
    Active,
    /// A player sank the entire opposing fleet (terminal)
    Completed,
    /// Abandoned before anyone joined (terminal)
    Closed,
}

impl MatchState {
    /// Whether no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, MatchState::Completed | MatchState::Closed)
    }
}

/// The central persisted aggregate: one game session between two identities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: MatchId,
    pub creator: PlayerId,
    pub joiner: Option<PlayerId>,
    pub state: MatchState,
    pub creator_board: Board,
    pub joiner_board: Board,
    /// Set if and only if the match is Active
    pub turn_holder: Option<PlayerId>,
    /// Set if and only if the match is Completed
    pub winner: Option<PlayerId>,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Informational: whether the most recent shot hit
    pub last_shot_was_hit: Option<bool>,
    /// Store revision; incremented on every successful conditional write
    pub version: u64,
}

impl Match {
    /// Construct a freshly created match in Open state
    pub fn new(id: MatchId, creator: PlayerId, creator_board: Board, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            creator,
            joiner: None,
            state: MatchState::Open,
            creator_board,
            joiner_board: Board::default(),
            turn_holder: None,
            winner: None,
            created_at,
            ended_at: None,
            last_shot_was_hit: None,
            version: 0,
        }
    }

    /// Whether `player` is one of the two participants
    pub fn is_participant(&self, player: &PlayerId) -> bool {
        self.creator == *player || self.joiner.as_ref() == Some(player)
    }

    /// The opponent of `player`, if both seats are filled
    pub fn opponent_of(&self, player: &PlayerId) -> Option<PlayerId> {
        if self.creator == *player {
            self.joiner
        } else if self.joiner.as_ref() == Some(player) {
            Some(self.creator)
        } else {
            None
        }
    }

    /// Reduced public view with boards omitted, for spectators and listings
    pub fn summary(&self) -> MatchSummary {
        MatchSummary {
            id: self.id,
            creator: self.creator,
            joiner: self.joiner,
            state: self.state,
            winner: self.winner,
            created_at: self.created_at,
            ended_at: self.ended_at,
        }
    }
}

/// Public projection of a match: everything except the boards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub id: MatchId,
    pub creator: PlayerId,
    pub joiner: Option<PlayerId>,
    pub state: MatchState,
    pub winner: Option<PlayerId>,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;

    fn open_match() -> Match {
        Match::new(MatchId::new(), PlayerId::new(), Board::default(), Utc::now())
    }

    #[test]
    fn test_new_match_invariants() {
        let m = open_match();
        assert_eq!(m.state, MatchState::Open);
        assert!(m.joiner.is_none());
        assert!(m.turn_holder.is_none());
        assert!(m.winner.is_none());
        assert!(m.ended_at.is_none());
        assert_eq!(m.version, 0);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!MatchState::Open.is_terminal());
        assert!(!MatchState::Active.is_terminal());
        assert!(MatchState::Completed.is_terminal());
        assert!(MatchState::Closed.is_terminal());
    }

    #[test]
    fn test_opponent_lookup() {
        let mut m = open_match();
        let joiner = PlayerId::new();
        assert_eq!(m.opponent_of(&m.creator.clone()), None);

        m.joiner = Some(joiner);
        assert_eq!(m.opponent_of(&m.creator.clone()), Some(joiner));
        assert_eq!(m.opponent_of(&joiner), Some(m.creator));
        assert_eq!(m.opponent_of(&PlayerId::new()), None);
    }

    #[test]
    fn test_summary_omits_boards() {
        let m = open_match();
        let summary = m.summary();
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("creatorBoard").is_none());
        assert!(json.get("joinerBoard").is_none());
        assert_eq!(json["state"], "open");
    }

    #[test]
    fn test_state_serialization() {
        assert_eq!(serde_json::to_string(&MatchState::Active).unwrap(), "\"active\"");
        let state: MatchState = serde_json::from_str("\"closed\"").unwrap();
        assert_eq!(state, MatchState::Closed);
    }
}
