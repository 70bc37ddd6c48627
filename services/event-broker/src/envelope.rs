//! Wire envelope for push events
//!
//! One envelope per event:
//! `{ event, matchId?, clientId?, ...payload, timestamp }`.
//! `matchId` is absent only on `connected`; `clientId` is present only on
//! `connected`. Keep-alives are not events: they travel as a separate frame
//! kind so the transport can render them as a non-data heartbeat.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use types::ids::{ClientId, MatchId};

/// Event types a subscriber can observe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    /// Connection established; carries the assigned client id
    Connected,
    /// Subscription acknowledged for one match id
    Subscribed,
    /// A second player joined and the match went Active
    PlayerJoined,
    /// A shot hit; on the terminal shot the payload carries `gameOver`
    Hit,
    /// A shot missed and the turn flipped
    Miss,
    /// The match was force-closed by the abandonment sweep
    Closed,
}

/// One push message delivered to subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub event: EventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_id: Option<MatchId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientId>,
    /// Event-specific fields, spread into the envelope on the wire
    #[serde(flatten)]
    pub payload: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl Envelope {
    /// Envelope for a match-scoped event
    pub fn for_match(match_id: MatchId, event: EventKind, payload: Map<String, Value>) -> Self {
        Self {
            event,
            match_id: Some(match_id),
            client_id: None,
            payload,
            timestamp: Utc::now(),
        }
    }

    /// The initial `connected` envelope carrying the assigned client id
    pub fn connected(client_id: ClientId) -> Self {
        Self {
            event: EventKind::Connected,
            match_id: None,
            client_id: Some(client_id),
            payload: Map::new(),
            timestamp: Utc::now(),
        }
    }

    /// The `subscribed` acknowledgment for one match id
    pub fn subscribed(match_id: MatchId) -> Self {
        Self::for_match(match_id, EventKind::Subscribed, Map::new())
    }
}

/// What a connection's queue actually carries
///
/// Keep-alives exist purely to defeat idle-timeout teardown by
/// intermediaries; they carry no event payload and must never be mistaken
/// for a game event by a subscriber.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Event(Envelope),
    KeepAlive,
}
