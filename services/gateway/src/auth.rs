//! Caller identity extraction
//!
//! Authentication itself happens upstream (a session gateway or reverse
//! proxy); by the time a request reaches these handlers the bearer token is
//! the caller's opaque player id. The extractors only recover that id and
//! pass it explicitly into the engine, which keeps the engine decoupled
//! from any particular authentication transport.

use crate::error::AppError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use types::ids::PlayerId;
use uuid::Uuid;

/// An authenticated caller; rejects the request when identity is missing
pub struct Caller(pub PlayerId);

/// A caller that may be anonymous (spectator endpoints)
pub struct MaybeCaller(pub Option<PlayerId>);

fn identity_from_parts(parts: &Parts) -> Result<Option<PlayerId>, AppError> {
    let Some(header) = parts.headers.get("Authorization") else {
        return Ok(None);
    };
    let value = header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid authorization header".into()))?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Expected bearer credentials".into()))?;
    let id = Uuid::parse_str(token)
        .map_err(|_| AppError::Unauthorized("Malformed caller identity".into()))?;
    Ok(Some(PlayerId::from_uuid(id)))
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity_from_parts(parts)?
            .map(Caller)
            .ok_or_else(|| AppError::Unauthorized("Missing caller identity".into()))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeCaller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeCaller(identity_from_parts(parts)?))
    }
}
