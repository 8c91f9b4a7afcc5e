//! Common test utilities for the integration tests.
//!
//! Shared infrastructure:
//! - Vec-backed in-memory Repository (no live Postgres needed)
//! - Mock auth provider wiring (no live Supabase needed)
//! - App state construction and server spawning helpers
//! - Seed helpers for accounts, profiles and content rows

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use shams_academy::{
    AppConfig, AppState, MockAuthService, SessionContext, create_router,
    error::RepoError,
    models::{AdminOverview, AuthPayload, Book, ContentDraft, ContentItem, Course, NewsItem, Profile},
    repository::{Repository, RepositoryState},
    session_store::AuthState,
};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use uuid::Uuid;

/// Signing secret shared by the mock auth provider and `AppConfig::default()`,
/// so tokens the mock issues validate during session resolution.
pub const TEST_JWT_SECRET: &str = "super-insecure-local-jwt-secret";

/// Administrator email matching `AppConfig::default()`; the "Admin" alias
/// resolves to this address.
pub const ADMIN_EMAIL: &str = "admin@shamsacademy.com";

// --- In-Memory Repository ---

/// InMemoryRepository
///
/// A Vec-backed `Repository` used by the integration tests. Rows live behind
/// mutexes so tests can seed and inspect them directly, and the `fail` flag
/// turns every call into a database error to exercise degraded paths.
#[derive(Default)]
pub struct InMemoryRepository {
    pub profiles: Mutex<Vec<Profile>>,
    pub news: Mutex<Vec<NewsItem>>,
    pub books: Mutex<Vec<Book>>,
    pub courses: Mutex<Vec<Course>>,
    fail: Mutex<bool>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips the repository into (or out of) a failing state; every trait
    /// method then reports a pool timeout.
    pub fn set_failing(&self, failing: bool) {
        *self.fail.lock().unwrap() = failing;
    }

    fn check_available(&self) -> Result<(), RepoError> {
        if *self.fail.lock().unwrap() {
            return Err(RepoError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    /// Seeds a profile row directly, bypassing registration.
    pub fn seed_profile(&self, id: Uuid, email: &str, role: &str) -> Profile {
        let profile = Profile {
            id,
            email: email.to_string(),
            full_name: None,
            role: role.to_string(),
        };
        self.profiles.lock().unwrap().push(profile.clone());
        profile
    }

    /// Seeds a news row with an explicit age, keeping ordering assertions deterministic.
    pub fn seed_news(&self, title: &str, minutes_ago: i64) -> NewsItem {
        let item = NewsItem {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: format!("{} body", title),
            image_url: None,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        };
        self.news.lock().unwrap().push(item.clone());
        item
    }

    pub fn seed_book(&self, title: &str, minutes_ago: i64) -> Book {
        let book = Book {
            id: Uuid::new_v4(),
            title: title.to_string(),
            author: "Test Author".to_string(),
            description: format!("{} description", title),
            cover_url: None,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        };
        self.books.lock().unwrap().push(book.clone());
        book
    }

    pub fn seed_course(&self, title: &str, minutes_ago: i64) -> Course {
        let course = Course {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: format!("{} description", title),
            duration: "8 weeks".to_string(),
            image_url: None,
            student_count: 0,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        };
        self.courses.lock().unwrap().push(course.clone());
        course
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, RepoError> {
        self.check_available()?;
        let profiles = self.profiles.lock().unwrap();
        Ok(profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn upsert_profile(&self, profile: Profile) -> Result<Profile, RepoError> {
        self.check_available()?;
        let mut profiles = self.profiles.lock().unwrap();
        if let Some(existing) = profiles.iter_mut().find(|p| p.id == profile.id) {
            // Mirrors the conflict clause: email and name update, role is kept.
            existing.email = profile.email;
            existing.full_name = profile.full_name;
            return Ok(existing.clone());
        }
        profiles.push(profile.clone());
        Ok(profile)
    }

    async fn update_full_name(
        &self,
        id: Uuid,
        full_name: &str,
    ) -> Result<Option<Profile>, RepoError> {
        self.check_available()?;
        let mut profiles = self.profiles.lock().unwrap();
        let Some(profile) = profiles.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        profile.full_name = Some(full_name.to_string());
        Ok(Some(profile.clone()))
    }

    async fn list_news(&self, limit: Option<i64>) -> Result<Vec<NewsItem>, RepoError> {
        self.check_available()?;
        let mut rows = self.news.lock().unwrap().clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(n) = limit {
            rows.truncate(n as usize);
        }
        Ok(rows)
    }

    async fn list_books(&self, limit: Option<i64>) -> Result<Vec<Book>, RepoError> {
        self.check_available()?;
        let mut rows = self.books.lock().unwrap().clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(n) = limit {
            rows.truncate(n as usize);
        }
        Ok(rows)
    }

    async fn list_courses(&self, limit: Option<i64>) -> Result<Vec<Course>, RepoError> {
        self.check_available()?;
        let mut rows = self.courses.lock().unwrap().clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(n) = limit {
            rows.truncate(n as usize);
        }
        Ok(rows)
    }

    async fn insert_content(&self, draft: ContentDraft) -> Result<ContentItem, RepoError> {
        self.check_available()?;
        let created = match draft {
            ContentDraft::News {
                title,
                content,
                image_url,
            } => {
                let row = NewsItem {
                    id: Uuid::new_v4(),
                    title,
                    content,
                    image_url,
                    created_at: Utc::now(),
                };
                self.news.lock().unwrap().push(row.clone());
                ContentItem::News(row)
            }
            ContentDraft::Book {
                title,
                author,
                description,
                cover_url,
            } => {
                let row = Book {
                    id: Uuid::new_v4(),
                    title,
                    author,
                    description,
                    cover_url,
                    created_at: Utc::now(),
                };
                self.books.lock().unwrap().push(row.clone());
                ContentItem::Book(row)
            }
            ContentDraft::Course {
                title,
                description,
                duration,
                image_url,
            } => {
                let row = Course {
                    id: Uuid::new_v4(),
                    title,
                    description,
                    duration,
                    image_url,
                    student_count: 0,
                    created_at: Utc::now(),
                };
                self.courses.lock().unwrap().push(row.clone());
                ContentItem::Course(row)
            }
        };
        Ok(created)
    }

    async fn content_counts(&self) -> Result<AdminOverview, RepoError> {
        self.check_available()?;
        Ok(AdminOverview {
            news: self.news.lock().unwrap().len() as i64,
            books: self.books.lock().unwrap().len() as i64,
            courses: self.courses.lock().unwrap().len() as i64,
        })
    }
}

// --- State & Server Construction ---

/// Bundle returned by `build_state`: the assembled state plus direct handles on
/// the mock layers, so tests can seed accounts and rows and inspect writes.
pub struct TestHarness {
    pub state: AppState,
    pub repo: Arc<InMemoryRepository>,
    pub auth: MockAuthService,
}

/// Builds an AppState wired entirely to in-memory services: the default local
/// config, the mock auth provider and the Vec-backed repository.
pub fn build_state() -> TestHarness {
    build_state_with(MockAuthService::new(TEST_JWT_SECRET), AppConfig::default())
}

/// Same as `build_state`, but with a caller-supplied auth mock and config
/// (e.g. a failing provider, or a Production environment).
pub fn build_state_with(auth: MockAuthService, config: AppConfig) -> TestHarness {
    let repo = Arc::new(InMemoryRepository::new());
    let repo_state = repo.clone() as RepositoryState;
    let auth_state = Arc::new(auth.clone()) as AuthState;

    let sessions = SessionContext::new(auth_state, repo_state.clone(), config.clone());
    let state = AppState {
        repo: repo_state,
        sessions,
        config,
    };

    TestHarness { state, repo, auth }
}

/// A running instance of the application bound to an ephemeral port, backed by
/// the in-memory repository and the mock auth provider.
pub struct TestApp {
    pub address: String,
    pub repo: Arc<InMemoryRepository>,
    pub auth: MockAuthService,
}

pub async fn spawn_app() -> TestApp {
    let TestHarness { state, repo, auth } = build_state();
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp {
        address,
        repo,
        auth,
    }
}

/// A client that surfaces redirects instead of following them, so tests can
/// assert on the 303 + Location pairs the guards produce.
pub fn no_redirect_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to build client")
}

// --- Seeding & Sign-In Helpers ---

/// Seeds a ready-to-sign-in account: the mock auth account plus its profile row.
/// Returns the shared id.
pub fn seed_user(
    auth: &MockAuthService,
    repo: &InMemoryRepository,
    email: &str,
    password: &str,
    role: &str,
) -> Uuid {
    let id = auth.seed_account(email, password);
    repo.seed_profile(id, email, role);
    id
}

/// Seeds the configured administrator: the auth account under the admin email
/// plus a profile row carrying the admin role.
pub fn seed_admin(auth: &MockAuthService, repo: &InMemoryRepository, password: &str) -> Uuid {
    seed_user(auth, repo, ADMIN_EMAIL, password, "admin")
}

/// Signs an account in over HTTP and returns the full auth payload.
pub async fn sign_in(
    app: &TestApp,
    client: &reqwest::Client,
    identifier: &str,
    password: &str,
) -> AuthPayload {
    let response = client
        .post(format!("{}/login", app.address))
        .json(&serde_json::json!({ "identifier": identifier, "password": password }))
        .send()
        .await
        .expect("login request failed");
    assert_eq!(response.status(), 200, "seeded account should sign in");
    response.json().await.expect("auth payload should deserialize")
}

/// Convenience wrapper returning just the bearer token.
pub async fn sign_in_token(
    app: &TestApp,
    client: &reqwest::Client,
    identifier: &str,
    password: &str,
) -> String {
    sign_in(app, client, identifier, password)
        .await
        .session
        .expect("mock sign-in always issues a session")
        .access_token
}
