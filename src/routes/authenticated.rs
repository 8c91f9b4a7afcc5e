use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Defines the routes accessible to any signed-in user: the dashboard, the two
/// content listings, the settings form and logout.
///
/// Access Control Strategy:
/// The whole module is wrapped in the `require_session` guard when the router is
/// assembled; a request that does not resolve to a session is redirected to
/// /login before any handler here runs. Handlers that also need to know *who* is
/// asking take the `CurrentUser` extractor, which re-runs the same resolution.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /dashboard
        // The landing page payload: the user's email plus three-item previews of
        // news and courses. Preview fetch failures degrade to empty lists.
        .route("/dashboard", get(handlers::dashboard))
        // GET /news
        // Every announcement, newest first.
        .route("/news", get(handlers::news_page))
        // GET /books
        // The full library listing, newest first.
        .route("/books", get(handlers::books_page))
        // GET/PUT /settings
        // Read and update the visitor's own profile row. Only the display name is
        // editable; the email belongs to the auth provider.
        .route(
            "/settings",
            get(handlers::settings_page).put(handlers::update_settings),
        )
        // POST /logout
        // Ends the session (provider failures are swallowed) and redirects to /login.
        .route("/logout", post(handlers::logout))
}
