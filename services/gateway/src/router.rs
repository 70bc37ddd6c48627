use crate::handlers::{events, matches};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/matches", post(matches::create_match).get(matches::list_matches))
        .route("/matches/:id", get(matches::get_match))
        .route("/matches/:id/join", post(matches::join_match))
        .route("/matches/:id/shots", post(matches::apply_shot))
        .route("/events", get(events::event_stream))
        .route(
            "/events/:client_id/subscriptions/:match_id",
            post(events::subscribe).delete(events::unsubscribe),
        );

    Router::new()
        .nest("/v1", api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
