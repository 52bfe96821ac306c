use axum::{
    routing::{get, post},
    Router,
};
use dashmap::DashMap;
use kaiwa_agent::{AgentRuntime, HistoryAssembler};
use kaiwa_core::{KaiwaConfig, UserId};
use kaiwa_line::Messenger;
use kaiwa_store::ExchangeStore;
use std::sync::Arc;

/// Central shared state, passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: KaiwaConfig,
    pub agent: AgentRuntime,
    pub store: ExchangeStore,
    pub history: HistoryAssembler,
    pub messenger: Box<dyn Messenger>,
    /// One async mutex per user: history read + append happen under it.
    user_locks: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
}

impl AppState {
    pub fn new(
        config: KaiwaConfig,
        agent: AgentRuntime,
        store: ExchangeStore,
        messenger: Box<dyn Messenger>,
    ) -> Self {
        let history = HistoryAssembler::new(config.history_window(), config.history.max_exchanges);
        Self {
            config,
            agent,
            store,
            history,
            messenger,
            user_locks: DashMap::new(),
        }
    }

    /// Lock serializing this user's messages, or `None` when disabled.
    pub fn user_lock(&self, user_id: &UserId) -> Option<Arc<tokio::sync::Mutex<()>>> {
        if !self.config.history.serialize_per_user {
            return None;
        }
        let lock = self
            .user_locks
            .entry(user_id.to_string())
            .or_default()
            .clone();
        Some(lock)
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(crate::http::health::health_handler))
        .route("/callback", post(crate::http::callback::callback_handler))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
