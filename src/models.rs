use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// A registered account. The `id` is what every resource's author reference points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    // Unique login name.
    pub username: String,
}

/// Note
///
/// A private note from the `notes` table. Addressed by `slug`, visible only to its author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub text: String,
    // Unique, URL-safe identifier used in every note route.
    pub slug: String,
    // FK to users.id (Owner). Never updated after insert.
    pub author_id: Uuid,
}

/// News
///
/// A news item. Read-only for users; rows are seeded administratively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct News {
    pub id: i64,
    pub title: String,
    pub text: String,
    #[ts(type = "string")]
    pub date: NaiveDate,
}

/// Comment
///
/// A comment on a news item, augmented with the author's username (a join).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Comment {
    pub id: i64,
    pub news_id: i64,
    // FK to users.id (Owner). Never updated after insert.
    pub author_id: Uuid,
    pub text: String,
    #[ts(type = "string")]
    pub created: DateTime<Utc>,
    #[sqlx(default)]
    pub author_username: Option<String>,
}

// --- Repository Inputs ---

/// NewNote
///
/// A validated note ready to be inserted or written over an existing row.
/// The slug has already been derived from the title when the form left it blank.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNote {
    pub title: String,
    pub text: String,
    pub slug: String,
}

/// NewNews
///
/// Administrative seed input for the news feed.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNews {
    pub title: String,
    pub text: String,
    pub date: NaiveDate,
}

// --- Form Payloads (Input Schemas) ---

/// NoteForm
///
/// Body of `POST /add/` and `POST /edit/{slug}/`. An empty `slug` asks the server to derive one.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct NoteForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub slug: String,
}

/// CommentForm
///
/// Body of comment create and edit submissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

/// CredentialsForm
///
/// Body of `POST /auth/signup/` and `POST /auth/login/`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CredentialsForm {
    #[serde(default)]
    pub username: String,
}

// --- Page Schemas (Output) ---

/// Page
///
/// Minimal document returned by pages that carry no data of their own
/// (home, login, logout, signup, success).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Page {
    pub name: String,
    // Username of the viewer, if any.
    pub viewer: Option<String>,
}

/// NoteFormPage
///
/// Add/edit page: the form, prefilled when editing.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct NoteFormPage {
    pub form: NoteForm,
    pub note: Option<Note>,
}

/// NewsDetail
///
/// The news detail page: the item, its comment thread (oldest first) and, for
/// authenticated viewers only, an empty comment form.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct NewsDetail {
    pub news: News,
    pub comments: Vec<Comment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<CommentForm>,
}

/// CommentPage
///
/// Edit/delete confirmation page for a single comment.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CommentPage {
    pub comment: Comment,
    pub form: CommentForm,
}
