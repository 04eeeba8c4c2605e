use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use ya_portal::{
    models::{NewNews, NewNote},
    repository::{PostgresRepository, Repository, RepositoryError},
    InMemoryRepository,
};

// --- Test Context and Setup ---

/// Database pool for the Postgres-backed run. Requires `DATABASE_URL`.
struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext { pool }
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }
}

// Postgres rows outlive a test run, so every name carries a fresh suffix.
fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

fn note(slug: &str) -> NewNote {
    NewNote {
        title: "Заголовок".to_string(),
        text: "Текст".to_string(),
        slug: slug.to_string(),
    }
}

// --- Shared Behaviour ---

async fn check_note_lifecycle(repo: &dyn Repository) {
    let author = repo.create_user(&unique("author")).await.unwrap();
    let reader = repo.create_user(&unique("reader")).await.unwrap();
    let slug = unique("note");

    let created = repo.create_note(note(&slug), author.id).await.unwrap();
    assert_eq!(created.author_id, author.id);

    // Slugs are unique across all authors.
    let duplicate = repo.create_note(note(&slug), reader.id).await;
    assert!(matches!(duplicate, Err(RepositoryError::SlugTaken(ref taken)) if *taken == slug));

    // Only the author may change or remove the note.
    let renamed = unique("renamed");
    assert!(repo
        .update_note(&slug, reader.id, note(&renamed))
        .await
        .unwrap()
        .is_none());
    assert!(!repo.delete_note(&slug, reader.id).await);

    let updated = repo
        .update_note(&slug, author.id, note(&renamed))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.slug, renamed);
    assert!(repo.get_note(&slug).await.is_none());

    let listed = repo.get_notes_by_author(author.id).await;
    assert_eq!(listed.len(), 1);
    assert!(repo.get_notes_by_author(reader.id).await.is_empty());

    assert!(repo.delete_note(&renamed, author.id).await);
    assert!(repo.get_note(&renamed).await.is_none());
}

async fn check_username_uniqueness(repo: &dyn Repository) {
    let username = unique("user");
    repo.create_user(&username).await.unwrap();

    let again = repo.create_user(&username).await;
    assert!(matches!(again, Err(RepositoryError::UsernameTaken(_))));
    assert_eq!(
        repo.get_user_by_username(&username).await.unwrap().username,
        username
    );
}

async fn check_comment_thread(repo: &dyn Repository) {
    let author = repo.create_user(&unique("commenter")).await.unwrap();
    let other = repo.create_user(&unique("other")).await.unwrap();
    let news = repo
        .create_news(NewNews {
            title: "Заголовок".to_string(),
            text: "Текст".to_string(),
            date: Utc::now().date_naive(),
        })
        .await
        .unwrap();

    let now = Utc::now();
    let later = repo
        .add_comment(news.id, author.id, "второй".to_string(), now + Duration::minutes(5))
        .await
        .unwrap();
    let earlier = repo
        .add_comment(news.id, author.id, "первый".to_string(), now)
        .await
        .unwrap();

    // Thread order follows `created`, not insertion.
    let thread = repo.get_comments(news.id).await;
    let ids: Vec<i64> = thread.iter().map(|comment| comment.id).collect();
    assert_eq!(ids, vec![earlier.id, later.id]);
    assert_eq!(thread[0].author_username, Some(author.username.clone()));

    assert!(repo
        .update_comment(earlier.id, other.id, "чужой".to_string())
        .await
        .is_none());
    let edited = repo
        .update_comment(earlier.id, author.id, "исправлено".to_string())
        .await
        .unwrap();
    assert_eq!(edited.text, "исправлено");
    assert_eq!(edited.created.timestamp(), earlier.created.timestamp());

    assert!(!repo.delete_comment(later.id, other.id).await);
    assert!(repo.delete_comment(later.id, author.id).await);
    assert!(repo.get_comment(later.id).await.is_none());

    let orphan = repo
        .add_comment(i64::MAX, author.id, "в пустоту".to_string(), now)
        .await;
    assert!(matches!(orphan, Err(RepositoryError::MissingReference)));
}

// --- In-Memory Repository ---

#[tokio::test]
async fn test_memory_note_lifecycle() {
    check_note_lifecycle(&InMemoryRepository::new()).await;
}

#[tokio::test]
async fn test_memory_username_uniqueness() {
    check_username_uniqueness(&InMemoryRepository::new()).await;
}

#[tokio::test]
async fn test_memory_comment_thread() {
    check_comment_thread(&InMemoryRepository::new()).await;
}

#[tokio::test]
async fn test_memory_home_news_limit_and_order() {
    let repo = InMemoryRepository::new();
    let today = Utc::now().date_naive();
    let feed: Vec<NewNews> = (0..12)
        .map(|index| NewNews {
            title: format!("Новость {index}"),
            text: "Текст".to_string(),
            date: today - Duration::days(index),
        })
        .collect();
    repo.bulk_create_news(feed).await.unwrap();

    let home = repo.get_home_news(10).await;
    assert_eq!(home.len(), 10);
    assert!(home.windows(2).all(|pair| pair[0].date >= pair[1].date));
    assert_eq!(home[0].date, today);
}

// --- Postgres Repository ---

#[tokio::test]
#[ignore = "requires a running Postgres at DATABASE_URL"]
async fn test_postgres_note_lifecycle() {
    let ctx = DbTestContext::setup().await;
    check_note_lifecycle(&ctx.repository()).await;
}

#[tokio::test]
#[ignore = "requires a running Postgres at DATABASE_URL"]
async fn test_postgres_username_uniqueness() {
    let ctx = DbTestContext::setup().await;
    check_username_uniqueness(&ctx.repository()).await;
}

#[tokio::test]
#[ignore = "requires a running Postgres at DATABASE_URL"]
async fn test_postgres_comment_thread() {
    let ctx = DbTestContext::setup().await;
    check_comment_thread(&ctx.repository()).await;
}
