use serde::{Deserialize, Serialize};
use types::game::MatchState;
use types::ids::{ClientId, MatchId};

/// Body of a shot request
#[derive(Debug, Clone, Deserialize)]
pub struct ShotRequest {
    pub row: u8,
    pub col: u8,
}

/// Response to match creation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchResponse {
    pub match_id: MatchId,
    pub state: MatchState,
}

/// Response to a subscription request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeResponse {
    pub client_id: ClientId,
    pub match_id: MatchId,
    pub subscribed: bool,
}
