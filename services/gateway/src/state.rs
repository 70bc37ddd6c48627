use event_broker::EventBroker;
use game_engine::MatchEngine;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<MatchEngine>,
    pub broker: Arc<EventBroker>,
}

impl AppState {
    pub fn new(engine: Arc<MatchEngine>, broker: Arc<EventBroker>) -> Self {
        Self { engine, broker }
    }
}
