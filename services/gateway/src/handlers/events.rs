//! Event stream delivery over SSE
//!
//! `GET /v1/events` registers the connection with the broker and streams
//! its frames until the client goes away. Data frames carry one envelope as
//! JSON; keep-alive frames become SSE comments, which no event parser will
//! ever mistake for a game event. Dropping the stream (client disconnect or
//! server shutdown) unregisters the connection before the response body is
//! released, so the broker never holds a stale handle.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    extract::{Path, State},
    response::sse::{Event, Sse},
    Json,
};
use event_broker::{EventBroker, Frame};
use futures::Stream;
use tokio::sync::mpsc;
use tracing::warn;
use types::ids::{ClientId, MatchId};

use crate::error::AppError;
use crate::models::SubscribeResponse;
use crate::state::AppState;

pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<EventStream> {
    let (client_id, rx) = state.broker.register();
    Sse::new(EventStream {
        rx,
        _guard: UnregisterGuard { broker: state.broker.clone(), client_id },
    })
}

pub async fn subscribe(
    State(state): State<AppState>,
    Path((client_id, match_id)): Path<(ClientId, MatchId)>,
) -> Result<Json<SubscribeResponse>, AppError> {
    if !state.broker.subscribe(client_id, match_id) {
        return Err(AppError::NotFound(format!("client {client_id} is not connected")));
    }
    Ok(Json(SubscribeResponse { client_id, match_id, subscribed: true }))
}

pub async fn unsubscribe(
    State(state): State<AppState>,
    Path((client_id, match_id)): Path<(ClientId, MatchId)>,
) -> Result<Json<SubscribeResponse>, AppError> {
    if !state.broker.unsubscribe(client_id, match_id) {
        return Err(AppError::NotFound(format!("client {client_id} is not connected")));
    }
    Ok(Json(SubscribeResponse { client_id, match_id, subscribed: false }))
}

/// Unregisters the connection when the SSE body is dropped
struct UnregisterGuard {
    broker: Arc<EventBroker>,
    client_id: ClientId,
}

impl Drop for UnregisterGuard {
    fn drop(&mut self) {
        self.broker.unregister(&self.client_id);
    }
}

/// Adapts a connection's frame queue into an SSE event stream
pub struct EventStream {
    rx: mpsc::Receiver<Frame>,
    _guard: UnregisterGuard,
}

impl Stream for EventStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            return match self.rx.poll_recv(cx) {
                Poll::Ready(Some(Frame::Event(envelope))) => match serde_json::to_string(&envelope) {
                    Ok(json) => Poll::Ready(Some(Ok(Event::default().data(json)))),
                    Err(e) => {
                        warn!(error = %e, "failed to serialize envelope, skipping frame");
                        continue;
                    }
                },
                Poll::Ready(Some(Frame::KeepAlive)) => {
                    Poll::Ready(Some(Ok(Event::default().comment("keep-alive"))))
                }
                Poll::Ready(None) => Poll::Ready(None),
                Poll::Pending => Poll::Pending,
            };
        }
    }
}
