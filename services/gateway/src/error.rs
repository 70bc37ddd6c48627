use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use types::errors::GameError;

/// Central error type for the gateway
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg, None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            AppError::Game(err) => return game_error_response(err),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
                None,
            ),
        };
        error_body(status, code, message, details)
    }
}

fn game_error_response(err: GameError) -> Response {
    match err {
        GameError::Validation(msg) => {
            error_body(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg, None)
        }
        GameError::State { reason, turn_holder } => {
            // Out-of-turn errors carry the current holder for diagnostics
            let details = turn_holder.map(|holder| json!({ "currentTurn": holder }));
            error_body(StatusCode::BAD_REQUEST, "STATE_ERROR", reason, details)
        }
        GameError::Conflict(msg) => error_body(StatusCode::CONFLICT, "CONFLICT", msg, None),
        GameError::NotFound(msg) => error_body(StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
        GameError::Internal(msg) => {
            // Full context stays in the log; the caller gets an opaque failure
            tracing::error!(error = %msg, "internal engine error");
            error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
                None,
            )
        }
    }
}

fn error_body(
    status: StatusCode,
    code: &str,
    message: String,
    details: Option<serde_json::Value>,
) -> Response {
    let mut body = json!({
        "error": code,
        "message": message
    });
    if let Some(details) = details {
        body["details"] = details;
    }
    (status, Json(body)).into_response()
}
