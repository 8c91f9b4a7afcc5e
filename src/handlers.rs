use crate::{
    AppState,
    auth::CurrentUser,
    error::{ApiError, AuthServiceError, SessionError},
    models::{
        AdminOverview, AuthPayload, Book, Collection, ContentDraft, ContentItem, ContentList,
        DashboardPage, NewsItem, Profile, RefreshRequest, RegisterRequest, Session,
        SignInRequest, UpdateProfileRequest,
    },
    session::bearer_token,
};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Redirect,
};

// --- Navigation & Auth Handlers ---

/// root
///
/// [Ungated Route] The application entry point: everything starts at the dashboard,
/// and the guard chain takes over from there (no session lands on /login).
pub async fn root() -> Redirect {
    Redirect::to("/dashboard")
}

/// login_page
///
/// [Anonymous Route] Page marker for the login view. Carries no server data; its
/// value is the guard in front of it, which bounces signed-in visitors to the
/// dashboard.
#[utoipa::path(
    get,
    path = "/login",
    responses((status = 200, description = "Login page available"), (status = 303, description = "Already signed in"))
)]
pub async fn login_page() -> &'static str {
    "ok"
}

/// register_page
///
/// [Anonymous Route] Page marker for the registration view, gated like the login page.
#[utoipa::path(
    get,
    path = "/register",
    responses((status = 200, description = "Register page available"), (status = 303, description = "Already signed in"))
)]
pub async fn register_page() -> &'static str {
    "ok"
}

/// sign_in
///
/// [Anonymous Route] The password grant. Accepts an email address or the admin
/// alias as the identifier; the session context handles the alias translation and
/// repairs a missing profile row before answering.
///
/// *Note*: On rejection the provider's own message travels back verbatim in the
/// JSON error body, so the client can surface it unchanged.
#[utoipa::path(
    post,
    path = "/login",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthPayload),
        (status = 401, description = "Credentials rejected", body = crate::error::ErrorBody)
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> Result<Json<AuthPayload>, ApiError> {
    let auth = state
        .sessions
        .sign_in(&payload.identifier, &payload.password)
        .await?;
    Ok(Json(auth))
}

/// register
///
/// [Anonymous Route] Two-step registration: the external provider mints the auth
/// account, then the profile row is upserted under the same primary key. The
/// payload may come back without a session when the provider wants the email
/// confirmed first.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered", body = AuthPayload),
        (status = 400, description = "Sign-up rejected", body = crate::error::ErrorBody)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<AuthPayload>, ApiError> {
    let auth = state
        .sessions
        .register(&payload.email, &payload.password, &payload.full_name)
        .await
        .map_err(|e| match e {
            // A rejected sign-up (email taken, weak password) is the client's doing.
            SessionError::Auth(AuthServiceError::Rejected(msg)) => ApiError::BadRequest(msg),
            other => ApiError::from(other),
        })?;
    Ok(Json(auth))
}

/// refresh_session
///
/// [Ungated Route] Trades a refresh token for a fresh session. Ungated on purpose:
/// the caller's access token is typically already expired when this is needed.
#[utoipa::path(
    post,
    path = "/session/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New session", body = Session),
        (status = 401, description = "Refresh token rejected", body = crate::error::ErrorBody)
    )
)]
pub async fn refresh_session(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<Session>, ApiError> {
    let session = state.sessions.refresh(&payload.refresh_token).await?;
    Ok(Json(session))
}

/// logout
///
/// [Authenticated Route] Ends the session and sends the visitor back to the login
/// page. Sign-out never fails from the caller's point of view: a provider error is
/// logged and the redirect happens regardless, since the client is discarding its
/// tokens either way.
#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 303, description = "Signed out, redirected to /login"))
)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Redirect {
    let token = bearer_token(&headers).unwrap_or_default();
    state.sessions.sign_out(token).await;
    Redirect::to("/login")
}

// --- Student Page Handlers ---

/// dashboard
///
/// [Authenticated Route] The landing page payload: the signed-in user's email plus
/// the three newest news items and courses.
///
/// *Note*: The two preview fetches degrade to empty lists on failure instead of
/// erroring; the dashboard renders with whatever made it back.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses((status = 200, description = "Dashboard payload", body = DashboardPage))
)]
pub async fn dashboard(
    CurrentUser { email, .. }: CurrentUser,
    State(state): State<AppState>,
) -> Json<DashboardPage> {
    let news = match state.repo.list_news(Some(3)).await {
        Ok(items) => items,
        Err(e) => {
            tracing::error!("dashboard news fetch failed: {}", e);
            vec![]
        }
    };
    let courses = match state.repo.list_courses(Some(3)).await {
        Ok(items) => items,
        Err(e) => {
            tracing::error!("dashboard courses fetch failed: {}", e);
            vec![]
        }
    };

    Json(DashboardPage {
        email,
        news,
        courses,
    })
}

/// news_page
///
/// [Authenticated Route] Every announcement, newest first.
#[utoipa::path(
    get,
    path = "/news",
    responses((status = 200, description = "News listing", body = [NewsItem]))
)]
pub async fn news_page(
    _user: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<NewsItem>>, ApiError> {
    let items = state.repo.list_news(None).await?;
    Ok(Json(items))
}

/// books_page
///
/// [Authenticated Route] The full library listing, newest first.
#[utoipa::path(
    get,
    path = "/books",
    responses((status = 200, description = "Book listing", body = [Book]))
)]
pub async fn books_page(
    _user: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Book>>, ApiError> {
    let items = state.repo.list_books(None).await?;
    Ok(Json(items))
}

/// settings_page
///
/// [Authenticated Route] The profile row behind the settings form. The email is
/// shown but owned by the auth provider; only the display name is editable.
#[utoipa::path(
    get,
    path = "/settings",
    responses(
        (status = 200, description = "Profile", body = Profile),
        (status = 404, description = "No profile row", body = crate::error::ErrorBody)
    )
)]
pub async fn settings_page(
    CurrentUser { id, .. }: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Profile>, ApiError> {
    let profile = state
        .repo
        .get_profile(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("profile not found".to_string()))?;
    Ok(Json(profile))
}

/// update_settings
///
/// [Authenticated Route] Updates the display name by profile primary key and
/// returns the fresh row. Submitting the same name twice converges on the same row.
#[utoipa::path(
    put,
    path = "/settings",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = Profile),
        (status = 404, description = "No profile row", body = crate::error::ErrorBody)
    )
)]
pub async fn update_settings(
    CurrentUser { id, .. }: CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>, ApiError> {
    let profile = state
        .repo
        .update_full_name(id, &payload.full_name)
        .await?
        .ok_or_else(|| ApiError::NotFound("profile not found".to_string()))?;
    Ok(Json(profile))
}

// --- Admin Panel Handlers ---
//
// Authorization lives in the `require_admin` guard wrapped around the whole /admin
// group; by the time these run, the requester's profile carries the admin role.

/// admin_overview
///
/// [Admin Route] Row counts for the three managed collections, the landing view of
/// the panel.
#[utoipa::path(
    get,
    path = "/admin",
    responses((status = 200, description = "Collection counts", body = AdminOverview))
)]
pub async fn admin_overview(
    State(state): State<AppState>,
) -> Result<Json<AdminOverview>, ApiError> {
    let counts = state.repo.content_counts().await?;
    Ok(Json(counts))
}

/// admin_list_content
///
/// [Admin Route] The full listing of one collection, newest first. On failure the
/// client keeps whatever it was already showing and toasts the error body.
#[utoipa::path(
    get,
    path = "/admin/content/{collection}",
    params(("collection" = Collection, Path, description = "Target collection")),
    responses((status = 200, description = "Collection rows", body = ContentList))
)]
pub async fn admin_list_content(
    State(state): State<AppState>,
    Path(collection): Path<Collection>,
) -> Result<Json<ContentList>, ApiError> {
    let list = match collection {
        Collection::News => ContentList::News(state.repo.list_news(None).await?),
        Collection::Books => ContentList::Books(state.repo.list_books(None).await?),
        Collection::Courses => ContentList::Courses(state.repo.list_courses(None).await?),
    };
    Ok(Json(list))
}

/// admin_create_content
///
/// [Admin Route] Creates one row. The draft's `collection` tag picks the target
/// table and each variant carries only the fields that table accepts, so the
/// payload can never mix fields across collections.
#[utoipa::path(
    post,
    path = "/admin/content",
    request_body = ContentDraft,
    responses(
        (status = 201, description = "Created row", body = ContentItem),
        (status = 500, description = "Insert failed", body = crate::error::ErrorBody)
    )
)]
pub async fn admin_create_content(
    State(state): State<AppState>,
    Json(draft): Json<ContentDraft>,
) -> Result<(StatusCode, Json<ContentItem>), ApiError> {
    let collection = draft.collection();
    let created = state.repo.insert_content(draft).await?;
    tracing::info!("admin created a {} item", collection);
    Ok((StatusCode::CREATED, Json(created)))
}
