//! HTTP control surface (axum)

mod handlers;
pub mod response;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use crate::Config;
use crate::events::EventLog;
use crate::gemini::CookieStore;
use crate::session::SessionRegistry;

/// Shared state for every handler
#[derive(Clone)]
pub struct AppState {
    pub registry: SessionRegistry,
    pub events: Arc<EventLog>,
    pub config: Arc<Config>,
    pub cookie_store: Arc<CookieStore>,
}

impl AppState {
    pub fn new(config: Config, events: EventLog) -> Self {
        let cookie_store = Arc::new(CookieStore::new(&config.cookie_file));
        Self {
            registry: SessionRegistry::new(),
            events: Arc::new(events),
            config: Arc::new(config),
            cookie_store,
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/update_cookies", post(handlers::update_cookies))
        .route("/login_with_cookies", post(handlers::login_with_cookies))
        .route("/send_prompt", post(handlers::send_prompt))
        .route("/close_session", post(handlers::close_session))
        .route("/active_sessions", get(handlers::active_sessions))
        .with_state(state)
}
