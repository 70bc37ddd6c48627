use crate::auth::{Caller, MaybeCaller};
use crate::error::AppError;
use crate::models::{CreateMatchResponse, ShotRequest};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use game_engine::{MatchListing, MatchView, ShotOutcome};
use types::game::Match;
use types::ids::MatchId;

pub async fn create_match(
    State(state): State<AppState>,
    Caller(creator): Caller,
) -> Result<(StatusCode, Json<CreateMatchResponse>), AppError> {
    let game = state.engine.create_match(creator).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateMatchResponse { match_id: game.id, state: game.state }),
    ))
}

pub async fn list_matches(
    State(state): State<AppState>,
) -> Result<Json<MatchListing>, AppError> {
    Ok(Json(state.engine.list_matches().await?))
}

pub async fn get_match(
    State(state): State<AppState>,
    MaybeCaller(caller): MaybeCaller,
    Path(match_id): Path<MatchId>,
) -> Result<Json<MatchView>, AppError> {
    Ok(Json(state.engine.get_match(match_id, caller).await?))
}

pub async fn join_match(
    State(state): State<AppState>,
    Caller(joiner): Caller,
    Path(match_id): Path<MatchId>,
) -> Result<Json<Match>, AppError> {
    Ok(Json(state.engine.join_match(match_id, joiner).await?))
}

pub async fn apply_shot(
    State(state): State<AppState>,
    Caller(actor): Caller,
    Path(match_id): Path<MatchId>,
    Json(shot): Json<ShotRequest>,
) -> Result<Json<ShotOutcome>, AppError> {
    let outcome = state.engine.apply_shot(match_id, actor, shot.row, shot.col).await?;
    Ok(Json(outcome))
}
