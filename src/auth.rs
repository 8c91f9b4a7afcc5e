use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, session::SessionContext};

/// Claims
///
/// Represents the payload structure expected inside the store-issued access token
/// (a JSON Web Token). The token is signed with the shared secret the provider and
/// this application both know, and is validated locally on every request to a
/// gated route; no network hop is needed to answer "who is this".
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): The UUID of the auth account. This is the primary key used to
    /// fetch the user's profile and role from the public.profiles table.
    pub sub: Uuid,
    /// Expiration Time (exp): Timestamp after which the token must not be accepted.
    pub exp: usize,
    /// Issued At (iat): Timestamp when the token was issued.
    pub iat: usize,
}

/// CurrentUser Extractor Result
///
/// The resolved identity of an authenticated request: the profile joined with the
/// admin flag derived from its role. Handlers take this as an argument to read who
/// is asking; guards use the same resolution to decide where a request may go.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// The unique identifier shared by the auth account and the profile row.
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    /// 'student' or 'admin'; the single source of administrative authority.
    pub role: String,
    /// Derived from `role == "admin"` at resolution time, never from the email.
    pub is_admin: bool,
}

/// CurrentUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making CurrentUser usable as a function
/// argument in any gated handler. The heavy lifting lives in
/// `SessionContext::resolve`; this impl only wires it into axum's extraction flow.
///
/// Rejection: a `303 See Other` redirect to `/login`, matching the navigation
/// behavior of the gated pages themselves.
impl<S> FromRequestParts<S> for CurrentUser
where
    // S must allow sending across threads and sharing.
    S: Send + Sync,
    // Allows the extractor to pull the session context from the app state.
    SessionContext: FromRef<S>,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let sessions = SessionContext::from_ref(state);

        sessions.resolve(&parts.headers).await.map_err(|e| {
            tracing::debug!("session resolution failed: {}", e);
            Redirect::to("/login")
        })
    }
}

// --- Route Guards ---
//
// Each guard is a route-layer middleware attached to a whole route group via
// `middleware::from_fn_with_state`. Guard failures are ordinary redirects, so a
// browser walking the site simply lands where it is allowed to be.

/// require_session
///
/// [Authenticated Pages] Lets the request through when a session resolves; the
/// extractor's rejection already redirects everyone else to `/login`.
pub async fn require_session(_user: CurrentUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// require_admin
///
/// [Admin Pages] Lets the request through only when a session resolves AND its
/// profile carries the admin role. Non-admins and anonymous visitors alike are sent
/// to `/dashboard`; the admin area never reveals whether it exists to them.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    match state.sessions.resolve(request.headers()).await {
        Ok(user) if user.is_admin => next.run(request).await,
        Ok(user) => {
            tracing::debug!("admin route refused for non-admin user {}", user.id);
            Redirect::to("/dashboard").into_response()
        }
        Err(_) => Redirect::to("/dashboard").into_response(),
    }
}

/// require_anonymous
///
/// [Login/Register Pages] The inverse guard: an already signed-in visitor has no
/// business on the auth pages and is sent to `/dashboard`.
pub async fn require_anonymous(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if state.sessions.resolve(request.headers()).await.is_ok() {
        return Redirect::to("/dashboard").into_response();
    }
    next.run(request).await
}
