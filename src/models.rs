use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// Profile
///
/// Represents the user's canonical identity record stored in the `public.profiles` table.
/// The row is created by an idempotent upsert at registration and shares its primary key
/// with the external auth account.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Profile {
    // Primary Key, also the Foreign Key to the external auth.users table.
    pub id: Uuid,
    // The user's primary identifier.
    pub email: String,
    // Display name, editable from the settings page.
    pub full_name: Option<String>,
    // The RBAC field: 'student' or 'admin'.
    pub role: String,
}

/// NewsItem
///
/// An announcement record from the `public.news` table.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct NewsItem {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    // Dynamic URL for an illustration; the application never touches the asset itself.
    pub image_url: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Book
///
/// A library record from the `public.books` table.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub description: String,
    pub cover_url: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Course
///
/// A course record from the `public.courses` table.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    // Free-form length descriptor (e.g., "8 weeks").
    pub duration: String,
    pub image_url: Option<String>,
    // Enrollment counter; new rows start at zero, the hosted column default.
    pub student_count: i32,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

// --- Session Store Payloads (External Auth API) ---

/// Session
///
/// Token bundle issued by the external auth provider on sign-in, sign-up (when the
/// account is auto-confirmed) and refresh. The access token is a JWT we validate
/// locally against the shared secret; the refresh token buys a new bundle.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Session {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub refresh_token: String,
}

/// AuthAccount
///
/// The auth provider's own user record, reduced to the fields this application reads.
/// Read-only: account management stays with the provider.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AuthAccount {
    pub id: Uuid,
    pub email: String,
}

// --- Request Payloads (Input Schemas) ---

/// SignInRequest
///
/// Input payload for POST /login. `identifier` is usually an email address; the
/// configured admin alias is also accepted and translated server-side.
/// Note: The password is only passed through to the external auth provider and never
/// persisted or logged internally by this application.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SignInRequest {
    pub identifier: String,
    pub password: String,
}

/// RegisterRequest
///
/// Input payload for the public registration endpoint (POST /register).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

/// RefreshRequest
///
/// Input payload for POST /session/refresh: trades a refresh token for a new session.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// UpdateProfileRequest
///
/// Input payload for PUT /settings. Only the display name is editable; the email
/// column belongs to the auth provider and stays read-only here.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateProfileRequest {
    pub full_name: String,
}

/// Collection
///
/// Names one of the three content tables the admin panel manages. Used as a path
/// parameter (`/admin/content/{collection}`) and as the tag of `ContentDraft`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Collection {
    News,
    Books,
    Courses,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::News => "news",
            Collection::Books => "books",
            Collection::Courses => "courses",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ContentDraft
///
/// Input payload for POST /admin/content. The `collection` tag selects the target
/// table and each variant carries exactly the fields that table accepts, so a draft
/// can never smuggle fields belonging to a different collection.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "collection")]
#[ts(export)]
pub enum ContentDraft {
    #[serde(rename = "news")]
    News {
        title: String,
        content: String,
        #[serde(default)]
        image_url: Option<String>,
    },
    #[serde(rename = "books")]
    Book {
        title: String,
        author: String,
        description: String,
        #[serde(default)]
        cover_url: Option<String>,
    },
    #[serde(rename = "courses")]
    Course {
        title: String,
        description: String,
        duration: String,
        #[serde(default)]
        image_url: Option<String>,
    },
}

impl ContentDraft {
    /// The collection this draft inserts into.
    pub fn collection(&self) -> Collection {
        match self {
            ContentDraft::News { .. } => Collection::News,
            ContentDraft::Book { .. } => Collection::Books,
            ContentDraft::Course { .. } => Collection::Courses,
        }
    }
}

// --- Page & Admin Schemas (Output) ---

/// AuthPayload
///
/// Output schema for POST /login and POST /register. Registration may come back
/// without a session when the provider requires email confirmation first.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuthPayload {
    pub session: Option<Session>,
    pub user: AuthAccount,
    pub profile: Profile,
    pub is_admin: bool,
}

/// DashboardPage
///
/// Output schema for GET /dashboard: the signed-in user's email plus short
/// newest-first previews of news and courses.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct DashboardPage {
    pub email: String,
    pub news: Vec<NewsItem>,
    pub courses: Vec<Course>,
}

/// AdminOverview
///
/// Output schema for GET /admin: row counts per managed collection.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminOverview {
    pub news: i64,
    pub books: i64,
    pub courses: i64,
}

/// ContentItem
///
/// A single created row, returned by POST /admin/content. Untagged: the JSON shape
/// of the row itself already tells the collections apart.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(untagged)]
#[ts(export)]
pub enum ContentItem {
    News(NewsItem),
    Book(Book),
    Course(Course),
}

/// ContentList
///
/// The full listing of one collection, returned by GET /admin/content/{collection}.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(untagged)]
#[ts(export)]
pub enum ContentList {
    News(Vec<NewsItem>),
    Books(Vec<Book>),
    Courses(Vec<Course>),
}

impl ContentList {
    pub fn len(&self) -> usize {
        match self {
            ContentList::News(items) => items.len(),
            ContentList::Books(items) => items.len(),
            ContentList::Courses(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
