use crate::error::RepoError;
use crate::models::{
    AdminOverview, Book, ContentDraft, ContentItem, Course, NewsItem, Profile,
};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations against the hosted
/// Postgres. This is the core of the Repository Abstraction pattern, allowing the
/// handlers and the session context to interact with the data layer without knowing
/// the specific implementation (Postgres, in-memory, etc.).
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable and usable across Axum's asynchronous
/// task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Profiles ---
    // Retrieval by primary key; used by session resolution and the settings page.
    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, RepoError>;
    // Idempotent write keyed on the primary key. The role column is written only
    // when the row is first created; existing rows keep their role.
    async fn upsert_profile(&self, profile: Profile) -> Result<Profile, RepoError>;
    // Settings update: the display name is the only editable column.
    async fn update_full_name(
        &self,
        id: Uuid,
        full_name: &str,
    ) -> Result<Option<Profile>, RepoError>;

    // --- Content Listings (newest first) ---
    async fn list_news(&self, limit: Option<i64>) -> Result<Vec<NewsItem>, RepoError>;
    async fn list_books(&self, limit: Option<i64>) -> Result<Vec<Book>, RepoError>;
    async fn list_courses(&self, limit: Option<i64>) -> Result<Vec<Course>, RepoError>;

    // --- Admin Actions ---
    // Inserts a draft into the collection its tag names and returns the created row.
    async fn insert_content(&self, draft: ContentDraft) -> Result<ContentItem, RepoError>;
    // Row counts per managed collection, for the admin landing page.
    async fn content_counts(&self) -> Result<AdminOverview, RepoError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the hosted
/// PostgreSQL database. All queries use the runtime query API with explicit binds,
/// so the crate builds without a live database connection.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// get_profile
    ///
    /// Retrieves the profile row (id, email, full_name, role) needed for session
    /// resolution, authorization and the settings page.
    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, RepoError> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT id, email, full_name, role FROM profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    /// upsert_profile
    ///
    /// Creates the mirroring profile record in `public.profiles` after external auth
    /// success. `ON CONFLICT (id) DO UPDATE` makes the registration's second step
    /// retry-safe: re-running it converges on the submitted values instead of failing
    /// on the duplicate key. The role is deliberately excluded from the update list,
    /// so a repeated registration can never demote an existing admin row.
    async fn upsert_profile(&self, profile: Profile) -> Result<Profile, RepoError> {
        let row = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (id, email, full_name, role)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
                SET email = EXCLUDED.email,
                    full_name = EXCLUDED.full_name
            RETURNING id, email, full_name, role
            "#,
        )
        .bind(profile.id)
        .bind(profile.email)
        .bind(profile.full_name)
        .bind(profile.role)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// update_full_name
    ///
    /// The settings-page write. Updates by primary key and returns the fresh row,
    /// or `None` when no profile exists for the id.
    async fn update_full_name(
        &self,
        id: Uuid,
        full_name: &str,
    ) -> Result<Option<Profile>, RepoError> {
        let row = sqlx::query_as::<_, Profile>(
            "UPDATE profiles SET full_name = $2 WHERE id = $1 RETURNING id, email, full_name, role",
        )
        .bind(id)
        .bind(full_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// list_news
    ///
    /// Announcements, newest first. QueryBuilder keeps the optional LIMIT safely
    /// parameterized.
    async fn list_news(&self, limit: Option<i64>) -> Result<Vec<NewsItem>, RepoError> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            "SELECT id, title, content, image_url, created_at FROM news ORDER BY created_at DESC",
        );
        if let Some(n) = limit {
            builder.push(" LIMIT ");
            builder.push_bind(n);
        }
        let rows = builder
            .build_query_as::<NewsItem>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// list_books
    ///
    /// Library records, newest first.
    async fn list_books(&self, limit: Option<i64>) -> Result<Vec<Book>, RepoError> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            "SELECT id, title, author, description, cover_url, created_at FROM books ORDER BY created_at DESC",
        );
        if let Some(n) = limit {
            builder.push(" LIMIT ");
            builder.push_bind(n);
        }
        let rows = builder
            .build_query_as::<Book>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// list_courses
    ///
    /// Course records, newest first.
    async fn list_courses(&self, limit: Option<i64>) -> Result<Vec<Course>, RepoError> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            "SELECT id, title, description, duration, image_url, student_count, created_at FROM courses ORDER BY created_at DESC",
        );
        if let Some(n) = limit {
            builder.push(" LIMIT ");
            builder.push_bind(n);
        }
        let rows = builder
            .build_query_as::<Course>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// insert_content
    ///
    /// Dispatches on the draft's tag: each variant carries exactly the columns of its
    /// target table. New course rows start with a zero enrollment counter.
    async fn insert_content(&self, draft: ContentDraft) -> Result<ContentItem, RepoError> {
        match draft {
            ContentDraft::News {
                title,
                content,
                image_url,
            } => {
                let row = sqlx::query_as::<_, NewsItem>(
                    r#"
                    INSERT INTO news (id, title, content, image_url, created_at)
                    VALUES ($1, $2, $3, $4, NOW())
                    RETURNING id, title, content, image_url, created_at
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(title)
                .bind(content)
                .bind(image_url)
                .fetch_one(&self.pool)
                .await?;
                Ok(ContentItem::News(row))
            }
            ContentDraft::Book {
                title,
                author,
                description,
                cover_url,
            } => {
                let row = sqlx::query_as::<_, Book>(
                    r#"
                    INSERT INTO books (id, title, author, description, cover_url, created_at)
                    VALUES ($1, $2, $3, $4, $5, NOW())
                    RETURNING id, title, author, description, cover_url, created_at
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(title)
                .bind(author)
                .bind(description)
                .bind(cover_url)
                .fetch_one(&self.pool)
                .await?;
                Ok(ContentItem::Book(row))
            }
            ContentDraft::Course {
                title,
                description,
                duration,
                image_url,
            } => {
                let row = sqlx::query_as::<_, Course>(
                    r#"
                    INSERT INTO courses (id, title, description, duration, image_url, student_count, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6, NOW())
                    RETURNING id, title, description, duration, image_url, student_count, created_at
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(title)
                .bind(description)
                .bind(duration)
                .bind(image_url)
                .bind(0_i32)
                .fetch_one(&self.pool)
                .await?;
                Ok(ContentItem::Course(row))
            }
        }
    }

    /// content_counts
    ///
    /// Compiles the row counters for the admin landing page in a single call.
    async fn content_counts(&self) -> Result<AdminOverview, RepoError> {
        let news = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM news")
            .fetch_one(&self.pool)
            .await?;
        let books = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        let courses = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM courses")
            .fetch_one(&self.pool)
            .await?;
        Ok(AdminOverview {
            news,
            books,
            courses,
        })
    }
}
