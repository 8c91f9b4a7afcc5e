mod common;

use axum::{
    extract::FromRequestParts,
    http::{Method, Request, StatusCode, Uri, header, request::Parts},
    response::{IntoResponse, Redirect},
};
use common::{
    TEST_JWT_SECRET, build_state, build_state_with, no_redirect_client, seed_user, sign_in_token,
    spawn_app,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use shams_academy::{
    AppConfig, MockAuthService,
    auth::{Claims, CurrentUser},
    config::Env,
};
use std::time::SystemTime;
use uuid::Uuid;

// --- Helper Functions ---

const TEST_USER_ID: Uuid = Uuid::from_u128(1);

fn create_token(user_id: Uuid, exp_offset: i64) -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let claims = Claims {
        sub: user_id,
        iat: now as usize,
        // Negative offsets produce an already-expired token.
        exp: (now + exp_offset) as usize,
    };

    let key = EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

/// Helper to get the mutable Parts struct from a generated Request
fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

/// The extractor rejects with a redirect response rather than a bare status;
/// this unpacks where it points.
fn rejection_target(rejection: Redirect) -> (StatusCode, String) {
    let response = rejection.into_response();
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    (response.status(), location)
}

// --- Extractor Tests ---

#[tokio::test]
async fn test_session_resolves_with_valid_jwt() {
    let harness = build_state();
    harness
        .repo
        .seed_profile(TEST_USER_ID, "test@example.com", "student");

    let token = create_token(TEST_USER_ID, 3600);
    let mut parts = get_request_parts(Method::GET, "/dashboard".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );

    let user = CurrentUser::from_request_parts(&mut parts, &harness.state).await;

    assert!(user.is_ok());
    let user = user.unwrap();
    assert_eq!(user.id, TEST_USER_ID);
    assert_eq!(user.email, "test@example.com");
    assert_eq!(user.role, "student");
    assert!(!user.is_admin);
}

#[tokio::test]
async fn test_admin_role_sets_admin_flag() {
    let harness = build_state();
    harness
        .repo
        .seed_profile(TEST_USER_ID, "head@example.com", "admin");

    let token = create_token(TEST_USER_ID, 3600);
    let mut parts = get_request_parts(Method::GET, "/admin".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );

    let user = CurrentUser::from_request_parts(&mut parts, &harness.state)
        .await
        .unwrap();
    assert!(user.is_admin);
}

#[tokio::test]
async fn test_resolution_fails_without_header() {
    let harness = build_state();

    let mut parts = get_request_parts(Method::GET, "/dashboard".parse().unwrap());
    let result = CurrentUser::from_request_parts(&mut parts, &harness.state).await;

    assert!(result.is_err());
    let (status, location) = rejection_target(result.unwrap_err());
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location, "/login");
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let harness = build_state();
    harness
        .repo
        .seed_profile(TEST_USER_ID, "test@example.com", "student");

    // Two hours past expiry, well beyond the validator's leeway.
    let token = create_token(TEST_USER_ID, -7200);
    let mut parts = get_request_parts(Method::GET, "/dashboard".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );

    let result = CurrentUser::from_request_parts(&mut parts, &harness.state).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_token_for_vanished_profile_rejected() {
    let harness = build_state();

    // Valid signature, but nothing in the profiles table behind it.
    let token = create_token(Uuid::new_v4(), 3600);
    let mut parts = get_request_parts(Method::GET, "/dashboard".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );

    let result = CurrentUser::from_request_parts(&mut parts, &harness.state).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_local_bypass_success() {
    // The default test config runs Local, so the header shortcut is active.
    let harness = build_state();
    let user_id = Uuid::new_v4();
    harness.repo.seed_profile(user_id, "local@dev.com", "admin");

    let mut parts = get_request_parts(Method::GET, "/admin".parse().unwrap());
    parts.headers.insert(
        header::HeaderName::from_static("x-user-id"),
        header::HeaderValue::from_str(&user_id.to_string()).unwrap(),
    );

    let user = CurrentUser::from_request_parts(&mut parts, &harness.state).await;

    assert!(user.is_ok());
    let user = user.unwrap();
    assert_eq!(user.id, user_id);
    assert!(user.is_admin);
}

#[tokio::test]
async fn test_local_bypass_disabled_in_prod() {
    let mut config = AppConfig::default();
    config.env = Env::Production;
    let harness = build_state_with(MockAuthService::new(TEST_JWT_SECRET), config);

    let user_id = Uuid::new_v4();
    harness.repo.seed_profile(user_id, "prod@example.com", "admin");

    let mut parts = get_request_parts(Method::GET, "/admin".parse().unwrap());
    // Provide ONLY the local bypass header
    parts.headers.insert(
        header::HeaderName::from_static("x-user-id"),
        header::HeaderValue::from_str(&user_id.to_string()).unwrap(),
    );

    let result = CurrentUser::from_request_parts(&mut parts, &harness.state).await;
    assert!(result.is_err());
}

// --- Guard Tests (over HTTP) ---

#[tokio::test]
async fn test_gated_pages_redirect_anonymous_visitors() {
    let app = spawn_app().await;
    let client = no_redirect_client();

    for path in ["/dashboard", "/news", "/books", "/settings"] {
        let response = client
            .get(format!("{}{}", app.address, path))
            .send()
            .await
            .expect("req fail");
        assert_eq!(response.status(), 303, "GET {} should redirect", path);
        assert_eq!(response.headers()["location"], "/login");
    }
}

#[tokio::test]
async fn test_admin_routes_redirect_non_admins() {
    let app = spawn_app().await;
    let client = no_redirect_client();
    seed_user(&app.auth, &app.repo, "plain@example.com", "hunter42", "student");
    let token = sign_in_token(&app, &client, "plain@example.com", "hunter42").await;

    for path in ["/admin", "/admin/content/news"] {
        let response = client
            .get(format!("{}{}", app.address, path))
            .bearer_auth(&token)
            .send()
            .await
            .expect("req fail");
        assert_eq!(response.status(), 303, "GET {} should redirect", path);
        assert_eq!(response.headers()["location"], "/dashboard");
    }

    // Writes are covered by the same guard.
    let response = client
        .post(format!("{}/admin/content", app.address))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "collection": "news",
            "title": "Sneaky",
            "content": "Should never land"
        }))
        .send()
        .await
        .expect("post fail");
    assert_eq!(response.status(), 303);
    assert!(app.repo.news.lock().unwrap().is_empty());

    // Anonymous visitors are pointed the same way; the panel stays indistinguishable.
    let response = client
        .get(format!("{}/admin", app.address))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), 303);
    assert_eq!(response.headers()["location"], "/dashboard");
}

#[tokio::test]
async fn test_auth_pages_redirect_signed_in_visitors() {
    let app = spawn_app().await;
    let client = no_redirect_client();
    seed_user(&app.auth, &app.repo, "settled@example.com", "hunter42", "student");
    let token = sign_in_token(&app, &client, "settled@example.com", "hunter42").await;

    for path in ["/login", "/register"] {
        let response = client
            .get(format!("{}{}", app.address, path))
            .bearer_auth(&token)
            .send()
            .await
            .expect("req fail");
        assert_eq!(response.status(), 303, "GET {} should redirect", path);
        assert_eq!(response.headers()["location"], "/dashboard");
    }

    // Signed-out visitors still reach the login page.
    let response = client
        .get(format!("{}/login", app.address))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), 200);
}
