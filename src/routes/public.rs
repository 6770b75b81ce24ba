use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that do not require a session. Everything else in the API is scoped to
/// the caller, so the only anonymous operations are creating an account and
/// obtaining a token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for load balancers. Does not touch the database.
        .route("/health", get(|| async { "ok" }))
        // POST /api/users
        // Registers a new account. Duplicate usernames are rejected with 400.
        .route("/api/users", post(handlers::register_user))
        // POST /api/users/login
        // Verifies credentials and returns a session token.
        .route("/api/users/login", post(handlers::login_user))
}
