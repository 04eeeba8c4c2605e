use crate::models::{Comment, NewNews, NewNote, News, Note, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// RepositoryError
///
/// Failures a caller has to tell apart. Everything else is logged where it happens
/// and collapses to `None` / `false` / an empty list.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("slug {0:?} is already taken")]
    SlugTaken(String),
    #[error("username {0:?} is already taken")]
    UsernameTaken(String),
    #[error("referenced row does not exist")]
    MissingReference,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Repository Trait
///
/// The persistence contract behind every handler. Owner-only mutations take the
/// acting user's id and only touch rows that user authored, so a request that
/// slipped past the access gate still cannot change someone else's data.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: Uuid) -> Option<User>;
    async fn get_user_by_username(&self, username: &str) -> Option<User>;
    async fn create_user(&self, username: &str) -> Result<User, RepositoryError>;

    // --- Notes ---
    async fn get_note(&self, slug: &str) -> Option<Note>;
    // Notes written by `author_id`, oldest first.
    async fn get_notes_by_author(&self, author_id: Uuid) -> Vec<Note>;
    async fn create_note(&self, note: NewNote, author_id: Uuid) -> Result<Note, RepositoryError>;
    // Owner-Only: `Ok(None)` when no note with `slug` belongs to `author_id`.
    async fn update_note(
        &self,
        slug: &str,
        author_id: Uuid,
        note: NewNote,
    ) -> Result<Option<Note>, RepositoryError>;
    // Owner-Only.
    async fn delete_note(&self, slug: &str, author_id: Uuid) -> bool;
    async fn count_notes(&self) -> i64;

    // --- News (administrative seeding, public reads) ---
    async fn create_news(&self, news: NewNews) -> Result<News, RepositoryError>;
    async fn bulk_create_news(&self, news: Vec<NewNews>) -> Result<Vec<News>, RepositoryError>;
    async fn get_news(&self, id: i64) -> Option<News>;
    // Newest first, at most `limit` items.
    async fn get_home_news(&self, limit: i64) -> Vec<News>;

    // --- Comments ---
    async fn add_comment(
        &self,
        news_id: i64,
        author_id: Uuid,
        text: String,
        created: DateTime<Utc>,
    ) -> Result<Comment, RepositoryError>;
    async fn get_comment(&self, id: i64) -> Option<Comment>;
    // Thread order: `created` ascending, then `id` ascending.
    async fn get_comments(&self, news_id: i64) -> Vec<Comment>;
    // Owner-Only.
    async fn update_comment(&self, id: i64, author_id: Uuid, text: String) -> Option<Comment>;
    // Owner-Only.
    async fn delete_comment(&self, id: i64, author_id: Uuid) -> bool;
    async fn count_comments(&self) -> i64;
}

/// RepositoryState
///
/// The shared handle to the persistence layer held in `AppState`.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL. Schema lives in `migrations/`.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Maps unique and foreign-key violations to the domain errors callers branch on.
fn classify(error: sqlx::Error, value: &str) -> RepositoryError {
    if let sqlx::Error::Database(db) = &error {
        if db.is_unique_violation() {
            match db.constraint() {
                Some("notes_slug_key") => return RepositoryError::SlugTaken(value.to_string()),
                Some("users_username_key") => {
                    return RepositoryError::UsernameTaken(value.to_string());
                }
                _ => {}
            }
        }
        if db.is_foreign_key_violation() {
            return RepositoryError::MissingReference;
        }
    }
    RepositoryError::Database(error)
}

const COMMENT_COLUMNS: &str =
    "c.id, c.news_id, c.author_id, c.text, c.created, u.username AS author_username";

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: Uuid) -> Option<User> {
        sqlx::query_as::<_, User>("SELECT id, username FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_user error: {:?}", e);
                None
            })
    }

    async fn get_user_by_username(&self, username: &str) -> Option<User> {
        sqlx::query_as::<_, User>("SELECT id, username FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_user_by_username error: {:?}", e);
                None
            })
    }

    async fn create_user(&self, username: &str) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, username) VALUES ($1, $2) RETURNING id, username",
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, username))
    }

    // --- NOTES ---

    async fn get_note(&self, slug: &str) -> Option<Note> {
        sqlx::query_as::<_, Note>(
            "SELECT id, title, text, slug, author_id FROM notes WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_note error: {:?}", e);
            None
        })
    }

    async fn get_notes_by_author(&self, author_id: Uuid) -> Vec<Note> {
        match sqlx::query_as::<_, Note>(
            "SELECT id, title, text, slug, author_id FROM notes WHERE author_id = $1 ORDER BY id ASC",
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await
        {
            Ok(notes) => notes,
            Err(e) => {
                tracing::error!("get_notes_by_author error: {:?}", e);
                vec![]
            }
        }
    }

    async fn create_note(&self, note: NewNote, author_id: Uuid) -> Result<Note, RepositoryError> {
        sqlx::query_as::<_, Note>(
            r#"INSERT INTO notes (title, text, slug, author_id) VALUES ($1, $2, $3, $4)
               RETURNING id, title, text, slug, author_id"#,
        )
        .bind(&note.title)
        .bind(&note.text)
        .bind(&note.slug)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, &note.slug))
    }

    /// update_note
    ///
    /// `author_id` only appears in the WHERE clause: the author column is never rewritten.
    async fn update_note(
        &self,
        slug: &str,
        author_id: Uuid,
        note: NewNote,
    ) -> Result<Option<Note>, RepositoryError> {
        sqlx::query_as::<_, Note>(
            r#"UPDATE notes SET title = $3, text = $4, slug = $5
               WHERE slug = $1 AND author_id = $2
               RETURNING id, title, text, slug, author_id"#,
        )
        .bind(slug)
        .bind(author_id)
        .bind(&note.title)
        .bind(&note.text)
        .bind(&note.slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify(e, &note.slug))
    }

    async fn delete_note(&self, slug: &str, author_id: Uuid) -> bool {
        match sqlx::query("DELETE FROM notes WHERE slug = $1 AND author_id = $2")
            .bind(slug)
            .bind(author_id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_note error: {:?}", e);
                false
            }
        }
    }

    async fn count_notes(&self) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM notes")
            .fetch_one(&self.pool)
            .await
            .unwrap_or(0)
    }

    // --- NEWS ---

    async fn create_news(&self, news: NewNews) -> Result<News, RepositoryError> {
        let created = sqlx::query_as::<_, News>(
            "INSERT INTO news (title, text, date) VALUES ($1, $2, $3) RETURNING id, title, text, date",
        )
        .bind(news.title)
        .bind(news.text)
        .bind(news.date)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    /// bulk_create_news
    ///
    /// One multi-row INSERT built with QueryBuilder.
    async fn bulk_create_news(&self, news: Vec<NewNews>) -> Result<Vec<News>, RepositoryError> {
        if news.is_empty() {
            return Ok(vec![]);
        }
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO news (title, text, date) ");
        builder.push_values(news, |mut row, item| {
            row.push_bind(item.title)
                .push_bind(item.text)
                .push_bind(item.date);
        });
        builder.push(" RETURNING id, title, text, date");

        let created = builder
            .build_query_as::<News>()
            .fetch_all(&self.pool)
            .await?;
        Ok(created)
    }

    async fn get_news(&self, id: i64) -> Option<News> {
        sqlx::query_as::<_, News>("SELECT id, title, text, date FROM news WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_news error: {:?}", e);
                None
            })
    }

    async fn get_home_news(&self, limit: i64) -> Vec<News> {
        match sqlx::query_as::<_, News>(
            "SELECT id, title, text, date FROM news ORDER BY date DESC, id DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        {
            Ok(news) => news,
            Err(e) => {
                tracing::error!("get_home_news error: {:?}", e);
                vec![]
            }
        }
    }

    // --- COMMENTS ---

    /// add_comment
    ///
    /// Inserts and joins `users` in one statement so the returned comment carries
    /// the author's username.
    async fn add_comment(
        &self,
        news_id: i64,
        author_id: Uuid,
        text: String,
        created: DateTime<Utc>,
    ) -> Result<Comment, RepositoryError> {
        let query = format!(
            r#"
            WITH c AS (
                INSERT INTO comments (news_id, author_id, text, created) VALUES ($1, $2, $3, $4)
                RETURNING id, news_id, author_id, text, created
            )
            SELECT {COMMENT_COLUMNS} FROM c JOIN users u ON c.author_id = u.id
            "#
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(news_id)
            .bind(author_id)
            .bind(text)
            .bind(created)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify(e, ""))
    }

    async fn get_comment(&self, id: i64) -> Option<Comment> {
        let query = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments c JOIN users u ON c.author_id = u.id WHERE c.id = $1"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_comment error: {:?}", e);
                None
            })
    }

    async fn get_comments(&self, news_id: i64) -> Vec<Comment> {
        let query = format!(
            r#"SELECT {COMMENT_COLUMNS} FROM comments c JOIN users u ON c.author_id = u.id
               WHERE c.news_id = $1
               ORDER BY c.created ASC, c.id ASC"#
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(news_id)
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_comments error: {:?}", e);
                vec![]
            })
    }

    async fn update_comment(&self, id: i64, author_id: Uuid, text: String) -> Option<Comment> {
        let query = format!(
            r#"
            WITH c AS (
                UPDATE comments SET text = $3 WHERE id = $1 AND author_id = $2
                RETURNING id, news_id, author_id, text, created
            )
            SELECT {COMMENT_COLUMNS} FROM c JOIN users u ON c.author_id = u.id
            "#
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .bind(author_id)
            .bind(text)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("update_comment error: {:?}", e);
                None
            })
    }

    async fn delete_comment(&self, id: i64, author_id: Uuid) -> bool {
        match sqlx::query("DELETE FROM comments WHERE id = $1 AND author_id = $2")
            .bind(id)
            .bind(author_id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_comment error: {:?}", e);
                false
            }
        }
    }

    async fn count_comments(&self) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments")
            .fetch_one(&self.pool)
            .await
            .unwrap_or(0)
    }
}
