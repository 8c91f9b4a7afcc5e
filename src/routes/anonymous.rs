use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Anonymous Router Module
///
/// Defines the routes reserved for signed-out visitors: the login and registration
/// pages and their form submissions.
///
/// Access Control Strategy:
/// The whole module is wrapped in the `require_anonymous` guard when the router is
/// assembled. A visitor whose request already resolves to a session is redirected
/// to /dashboard before any handler here runs, for the POSTs as well as the GETs,
/// so a signed-in user cannot re-submit the auth forms.
pub fn anonymous_routes() -> Router<AppState> {
    Router::new()
        // GET/POST /login
        // The login page marker and the password-grant submission behind it.
        .route("/login", get(handlers::login_page).post(handlers::sign_in))
        // GET/POST /register
        // The registration page marker and the two-step account creation it submits to.
        .route(
            "/register",
            get(handlers::register_page).post(handlers::register),
        )
}
