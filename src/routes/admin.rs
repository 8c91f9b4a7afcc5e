use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Admin Router Module
///
/// Defines the create+list panel over the three content collections, exclusively
/// for profiles carrying the 'admin' role.
///
/// Access Control:
/// The whole module is wrapped in the `require_admin` guard when the router is
/// assembled. Anyone else, signed in or not, is redirected to /dashboard before a
/// handler runs, so these handlers never re-check the role themselves.
///
/// Paths carry the /admin prefix explicitly (the router is merged, not nested) so
/// the bare /admin landing route is an ordinary route like any other.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin
        // The panel landing view: row counts for the three managed collections.
        .route("/admin", get(handlers::admin_overview))
        // GET /admin/content/{collection}
        // Lists every row of one collection, newest first. The path parameter is
        // typed; an unknown collection name never reaches a handler.
        .route("/admin/content/{collection}", get(handlers::admin_list_content))
        // POST /admin/content
        // Creates one row. The draft's tag picks the target collection.
        .route("/admin/content", post(handlers::admin_create_content))
}
