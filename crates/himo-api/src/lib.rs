pub mod access;
pub mod admin;
pub mod auth;
pub mod chats;
pub mod error;
pub mod request;
pub mod response;
pub mod state;

use std::time::Duration;

use axum::{
    Router,
    http::{Method, header},
    routing::any,
};
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

/// Methods advertised by the auth endpoint.
pub const AUTH_METHODS: [Method; 3] = [Method::GET, Method::POST, Method::OPTIONS];

/// Methods advertised by the chat and admin endpoints.
pub const DEFAULT_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];

const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(86400);

/// Any origin. Answers every `OPTIONS` itself, so preflights never reach a
/// handler or the store.
fn cors(methods: impl IntoIterator<Item = Method>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(methods.into_iter().collect::<Vec<_>>())
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(PREFLIGHT_MAX_AGE)
}

/// One endpoint per handler. Each handler dispatches on method and `action`
/// itself, so every method is routed to it.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/auth", any(auth::handle).layer(cors(AUTH_METHODS)))
        .route("/chats", any(chats::handle).layer(cors(DEFAULT_METHODS)))
        .route("/admin", any(admin::handle).layer(cors(DEFAULT_METHODS)))
        .with_state(state)
}
