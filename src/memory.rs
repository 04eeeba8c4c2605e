use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    models::{Comment, NewNews, NewNote, News, Note, User},
    repository::{Repository, RepositoryError},
};

#[derive(Default)]
struct Tables {
    users: BTreeMap<Uuid, User>,
    notes: BTreeMap<i64, Note>,
    news: BTreeMap<i64, News>,
    comments: BTreeMap<i64, Comment>,
    next_note_id: i64,
    next_news_id: i64,
    next_comment_id: i64,
}

impl Tables {
    fn username_of(&self, id: Uuid) -> Option<String> {
        self.users.get(&id).map(|user| user.username.clone())
    }

    fn with_author(&self, comment: &Comment) -> Comment {
        Comment {
            author_username: self.username_of(comment.author_id),
            ..comment.clone()
        }
    }

    fn slug_in_use(&self, slug: &str, except: Option<i64>) -> bool {
        self.notes
            .values()
            .any(|note| note.slug == slug && Some(note.id) != except)
    }
}

/// InMemoryRepository
///
/// A `Repository` kept entirely in process memory. Backs the test suite and local
/// runs without `DATABASE_URL`. Enforces the same uniqueness, ownership and
/// ordering rules as the Postgres schema.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_user(&self, id: Uuid) -> Option<User> {
        self.tables.read().await.users.get(&id).cloned()
    }

    async fn get_user_by_username(&self, username: &str) -> Option<User> {
        self.tables
            .read()
            .await
            .users
            .values()
            .find(|user| user.username == username)
            .cloned()
    }

    async fn create_user(&self, username: &str) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|user| user.username == username) {
            return Err(RepositoryError::UsernameTaken(username.to_string()));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_note(&self, slug: &str) -> Option<Note> {
        self.tables
            .read()
            .await
            .notes
            .values()
            .find(|note| note.slug == slug)
            .cloned()
    }

    async fn get_notes_by_author(&self, author_id: Uuid) -> Vec<Note> {
        self.tables
            .read()
            .await
            .notes
            .values()
            .filter(|note| note.author_id == author_id)
            .cloned()
            .collect()
    }

    async fn create_note(&self, note: NewNote, author_id: Uuid) -> Result<Note, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&author_id) {
            return Err(RepositoryError::MissingReference);
        }
        if tables.slug_in_use(&note.slug, None) {
            return Err(RepositoryError::SlugTaken(note.slug));
        }
        tables.next_note_id += 1;
        let created = Note {
            id: tables.next_note_id,
            title: note.title,
            text: note.text,
            slug: note.slug,
            author_id,
        };
        tables.notes.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_note(
        &self,
        slug: &str,
        author_id: Uuid,
        note: NewNote,
    ) -> Result<Option<Note>, RepositoryError> {
        let mut tables = self.tables.write().await;
        let Some(id) = tables
            .notes
            .values()
            .find(|existing| existing.slug == slug && existing.author_id == author_id)
            .map(|existing| existing.id)
        else {
            return Ok(None);
        };
        if tables.slug_in_use(&note.slug, Some(id)) {
            return Err(RepositoryError::SlugTaken(note.slug));
        }
        let Some(existing) = tables.notes.get_mut(&id) else {
            return Ok(None);
        };
        existing.title = note.title;
        existing.text = note.text;
        existing.slug = note.slug;
        Ok(Some(existing.clone()))
    }

    async fn delete_note(&self, slug: &str, author_id: Uuid) -> bool {
        let mut tables = self.tables.write().await;
        let target = tables
            .notes
            .values()
            .find(|note| note.slug == slug && note.author_id == author_id)
            .map(|note| note.id);
        match target {
            Some(id) => tables.notes.remove(&id).is_some(),
            None => false,
        }
    }

    async fn count_notes(&self) -> i64 {
        self.tables.read().await.notes.len() as i64
    }

    async fn create_news(&self, news: NewNews) -> Result<News, RepositoryError> {
        let mut created = self.bulk_create_news(vec![news]).await?;
        created.pop().ok_or(RepositoryError::MissingReference)
    }

    async fn bulk_create_news(&self, news: Vec<NewNews>) -> Result<Vec<News>, RepositoryError> {
        let mut tables = self.tables.write().await;
        let mut created = Vec::with_capacity(news.len());
        for item in news {
            tables.next_news_id += 1;
            let row = News {
                id: tables.next_news_id,
                title: item.title,
                text: item.text,
                date: item.date,
            };
            tables.news.insert(row.id, row.clone());
            created.push(row);
        }
        Ok(created)
    }

    async fn get_news(&self, id: i64) -> Option<News> {
        self.tables.read().await.news.get(&id).cloned()
    }

    async fn get_home_news(&self, limit: i64) -> Vec<News> {
        let tables = self.tables.read().await;
        let mut news: Vec<News> = tables.news.values().cloned().collect();
        news.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        news.truncate(usize::try_from(limit).unwrap_or(0));
        news
    }

    async fn add_comment(
        &self,
        news_id: i64,
        author_id: Uuid,
        text: String,
        created: DateTime<Utc>,
    ) -> Result<Comment, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.news.contains_key(&news_id) || !tables.users.contains_key(&author_id) {
            return Err(RepositoryError::MissingReference);
        }
        tables.next_comment_id += 1;
        let comment = Comment {
            id: tables.next_comment_id,
            news_id,
            author_id,
            text,
            created,
            author_username: tables.username_of(author_id),
        };
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn get_comment(&self, id: i64) -> Option<Comment> {
        let tables = self.tables.read().await;
        tables.comments.get(&id).map(|comment| tables.with_author(comment))
    }

    async fn get_comments(&self, news_id: i64) -> Vec<Comment> {
        let tables = self.tables.read().await;
        let mut thread: Vec<Comment> = tables
            .comments
            .values()
            .filter(|comment| comment.news_id == news_id)
            .map(|comment| tables.with_author(comment))
            .collect();
        thread.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));
        thread
    }

    async fn update_comment(&self, id: i64, author_id: Uuid, text: String) -> Option<Comment> {
        let mut tables = self.tables.write().await;
        let comment = tables
            .comments
            .get_mut(&id)
            .filter(|comment| comment.author_id == author_id)?;
        comment.text = text;
        let updated = comment.clone();
        Some(tables.with_author(&updated))
    }

    async fn delete_comment(&self, id: i64, author_id: Uuid) -> bool {
        let mut tables = self.tables.write().await;
        let owned = tables
            .comments
            .get(&id)
            .is_some_and(|comment| comment.author_id == author_id);
        owned && tables.comments.remove(&id).is_some()
    }

    async fn count_comments(&self) -> i64 {
        self.tables.read().await.comments.len() as i64
    }
}
