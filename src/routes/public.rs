use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines the endpoints that carry no guard at all. Nothing here exposes user or
/// content data: the tier holds only the entry redirect, the liveness check and
/// the token refresh exchange.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // The application entry point. Always redirects to /dashboard; the
        // authenticated guard then decides whether the visitor actually gets there.
        .route("/", get(handlers::root))
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load balancer checks.
        // Returns "ok" immediately to verify the service is running and responsive.
        .route("/health", get(|| async { "ok" }))
        // POST /session/refresh
        // Trades a refresh token for a fresh session. Deliberately ungated: by the
        // time a client needs this, its access token has usually already expired.
        .route("/session/refresh", post(handlers::refresh_session))
}
