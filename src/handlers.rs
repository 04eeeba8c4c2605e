use crate::{
    AppState,
    access::authorize,
    auth::{AuthUser, SESSION_COOKIE, Viewer, issue_token, original_path},
    error::{AppError, found},
    forms::{self, FormErrors},
    models::{
        Comment, CommentForm, CommentPage, CredentialsForm, News, NewsDetail, Note, NoteForm,
        NoteFormPage, Page, User,
    },
    repository::RepositoryError,
};
use axum::{
    Form, Json,
    extract::{
        OriginalUri, Path, Query, State,
        rejection::{FormRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde::Deserialize;

/// Where note add/edit/delete land on success.
pub const NOTES_SUCCESS_URL: &str = "/done/";

const MAX_USERNAME_LENGTH: usize = 150;

// --- Query Structs ---

/// LoginQuery
///
/// `next` is the page the viewer was bounced from; login sends them back there.
#[derive(Deserialize, Default, utoipa::IntoParams)]
pub struct LoginQuery {
    pub next: Option<String>,
}

// --- Helpers ---

fn page(name: &str, viewer: &Viewer) -> Json<Page> {
    Json(Page {
        name: name.to_string(),
        viewer: viewer.0.as_ref().map(|user| user.username.clone()),
    })
}

// Ids are integers; anything else addresses no row.
fn id_param(path: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    path.map(|Path(id)| id).map_err(|_| AppError::NotFound)
}

// An unreadable body is an empty submission, so it fails validation like one.
fn submitted<T: Default>(form: Result<Form<T>, FormRejection>) -> T {
    match form {
        Ok(Form(payload)) => payload,
        Err(e) => {
            tracing::debug!("unreadable form body: {}", e);
            T::default()
        }
    }
}

/// Detail URL of a news item, the anchor target of every comment mutation.
pub fn news_detail_url(news_id: i64) -> String {
    format!("/news/{news_id}/")
}

fn comments_anchor(news_id: i64) -> String {
    format!("{}#comments", news_detail_url(news_id))
}

// Only same-site absolute paths are honoured as login targets.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(target) if target.starts_with('/') && !target.starts_with("//") && !target.contains('\\') => {
            target
        }
        _ => "/",
    }
}

fn validate_username(username: &str) -> Result<&str, FormErrors> {
    let username = username.trim();
    if username.is_empty() {
        return Err(FormErrors::single("username", forms::REQUIRED));
    }
    let well_formed = username.chars().count() <= MAX_USERNAME_LENGTH
        && username
            .chars()
            .all(|c| c.is_alphanumeric() || "@.+-_".contains(c));
    if !well_formed {
        return Err(FormErrors::single(
            "username",
            "Введите правильное имя пользователя. Оно может содержать только буквы, цифры и знаки @/./+/-/_.",
        ));
    }
    Ok(username)
}

// --- Users ---

/// home
///
/// [Public Route] Landing page of the notes application.
#[utoipa::path(get, path = "/", responses((status = 200, description = "Home", body = Page)))]
pub async fn home(viewer: Viewer) -> Json<Page> {
    page("notes:home", &viewer)
}

/// login_page
///
/// [Public Route] The login form. Always 200, logged in or not.
#[utoipa::path(
    get,
    path = "/auth/login/",
    params(LoginQuery),
    responses((status = 200, description = "Login form", body = Page))
)]
pub async fn login_page(viewer: Viewer, Query(_query): Query<LoginQuery>) -> Json<Page> {
    page("users:login", &viewer)
}

/// login
///
/// [Public Route] Starts a session for an existing user. The signed token is set as
/// the `session` cookie and the viewer is redirected to `next` (or home).
///
/// Credentials are identified by username only; password verification is not part of
/// this service.
#[utoipa::path(
    post,
    path = "/auth/login/",
    params(LoginQuery),
    request_body(content = CredentialsForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Logged in, redirected to next"),
        (status = 400, description = "Unknown user", body = FormErrors)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    jar: CookieJar,
    Form(payload): Form<CredentialsForm>,
) -> Result<(CookieJar, Response), AppError> {
    let username = validate_username(&payload.username).map_err(AppError::Validation)?;
    let user = state
        .repo
        .get_user_by_username(username)
        .await
        .ok_or_else(|| {
            AppError::Validation(FormErrors::single(
                "username",
                "Пользователь с таким именем не найден.",
            ))
        })?;

    let token = issue_token(user.id, &state.config.jwt_secret, state.config.session_ttl_seconds)
        .map_err(|e| AppError::Internal(format!("failed to sign session token: {e}")))?;

    tracing::info!(user_id = %user.id, "session started");

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    Ok((jar.add(cookie), found(safe_next(query.next.as_deref()))))
}

/// logout
///
/// [Public Route] Clears the session cookie. Bearer-token clients simply discard their token.
#[utoipa::path(get, path = "/auth/logout/", responses((status = 200, description = "Logged out", body = Page)))]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<Page>) {
    // Always emitted, whether or not the request carried a session.
    let mut removal = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    removal.make_removal();
    let jar = jar.add(removal);
    (
        jar,
        Json(Page {
            name: "users:logout".to_string(),
            viewer: None,
        }),
    )
}

/// signup_page
///
/// [Public Route] The registration form.
#[utoipa::path(get, path = "/auth/signup/", responses((status = 200, description = "Signup form", body = Page)))]
pub async fn signup_page(viewer: Viewer) -> Json<Page> {
    page("users:signup", &viewer)
}

/// signup
///
/// [Public Route] Registers a new username.
#[utoipa::path(
    post,
    path = "/auth/signup/",
    request_body(content = CredentialsForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 201, description = "Registered", body = User),
        (status = 400, description = "Invalid or taken username", body = FormErrors)
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    Form(payload): Form<CredentialsForm>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let username = validate_username(&payload.username).map_err(AppError::Validation)?;
    match state.repo.create_user(username).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "user registered");
            Ok((StatusCode::CREATED, Json(user)))
        }
        Err(RepositoryError::UsernameTaken(_)) => Err(AppError::Validation(FormErrors::single(
            "username",
            "Пользователь с таким именем уже существует.",
        ))),
        Err(e) => Err(e.into()),
    }
}

// --- Notes ---

/// notes_list
///
/// [Authenticated Route] The viewer's own notes. Other users' notes never appear.
#[utoipa::path(get, path = "/notes/", responses((status = 200, description = "My notes", body = [Note])))]
pub async fn notes_list(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Json<Vec<Note>> {
    Json(state.repo.get_notes_by_author(id).await)
}

/// note_add_page
///
/// [Authenticated Route] Empty note form.
#[utoipa::path(get, path = "/add/", responses((status = 200, description = "Note form", body = NoteFormPage)))]
pub async fn note_add_page(_user: AuthUser) -> Json<NoteFormPage> {
    Json(NoteFormPage::default())
}

/// note_add
///
/// [Authenticated Route] Creates a note owned by the viewer. The slug is derived from
/// the title when left blank and must be unique.
#[utoipa::path(
    post,
    path = "/add/",
    request_body(content = NoteForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Created, redirected to success page"),
        (status = 400, description = "Invalid form", body = FormErrors)
    )
)]
pub async fn note_add(
    AuthUser { id: author_id, .. }: AuthUser,
    State(state): State<AppState>,
    payload: Result<Form<NoteForm>, FormRejection>,
) -> Result<Response, AppError> {
    let note = forms::validate_note(submitted(payload)).map_err(AppError::Validation)?;
    match state.repo.create_note(note, author_id).await {
        Ok(created) => {
            tracing::info!(note_id = created.id, slug = %created.slug, "note created");
            Ok(found(NOTES_SUCCESS_URL))
        }
        Err(RepositoryError::SlugTaken(slug)) => Err(AppError::Validation(forms::slug_taken(&slug))),
        Err(e) => Err(e.into()),
    }
}

/// note_success
///
/// [Authenticated Route] Confirmation page after a note mutation.
#[utoipa::path(get, path = "/done/", responses((status = 200, description = "Success", body = Page)))]
pub async fn note_success(user: AuthUser) -> Json<Page> {
    page("notes:success", &Viewer(Some(user)))
}

/// note_detail
///
/// [Owner Route] A single note. 404 for anyone but its author.
#[utoipa::path(
    get,
    path = "/note/{slug}/",
    params(("slug" = String, Path, description = "Note slug")),
    responses((status = 200, description = "Found", body = Note), (status = 404, description = "Not Found"))
)]
pub async fn note_detail(
    Viewer(viewer): Viewer,
    State(state): State<AppState>,
    uri: OriginalUri,
    Path(slug): Path<String>,
) -> Result<Json<Note>, AppError> {
    let note = authorize(viewer.as_ref(), state.repo.get_note(&slug).await, &original_path(&uri.0))?;
    Ok(Json(note))
}

/// note_edit_page
///
/// [Owner Route] Edit form prefilled with the note.
#[utoipa::path(
    get,
    path = "/edit/{slug}/",
    params(("slug" = String, Path, description = "Note slug")),
    responses((status = 200, description = "Edit form", body = NoteFormPage), (status = 404, description = "Not Found"))
)]
pub async fn note_edit_page(
    Viewer(viewer): Viewer,
    State(state): State<AppState>,
    uri: OriginalUri,
    Path(slug): Path<String>,
) -> Result<Json<NoteFormPage>, AppError> {
    let note = authorize(viewer.as_ref(), state.repo.get_note(&slug).await, &original_path(&uri.0))?;
    Ok(Json(NoteFormPage {
        form: NoteForm {
            title: note.title.clone(),
            text: note.text.clone(),
            slug: note.slug.clone(),
        },
        note: Some(note),
    }))
}

/// note_edit
///
/// [Owner Route] Rewrites title, text and slug. The author never changes.
#[utoipa::path(
    post,
    path = "/edit/{slug}/",
    params(("slug" = String, Path, description = "Note slug")),
    request_body(content = NoteForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Updated, redirected to success page"),
        (status = 400, description = "Invalid form", body = FormErrors),
        (status = 404, description = "Not Found")
    )
)]
pub async fn note_edit(
    Viewer(viewer): Viewer,
    State(state): State<AppState>,
    uri: OriginalUri,
    Path(slug): Path<String>,
    payload: Result<Form<NoteForm>, FormRejection>,
) -> Result<Response, AppError> {
    let note = authorize(viewer.as_ref(), state.repo.get_note(&slug).await, &original_path(&uri.0))?;
    let changes = forms::validate_note(submitted(payload)).map_err(AppError::Validation)?;

    match state.repo.update_note(&note.slug, note.author_id, changes).await {
        Ok(Some(updated)) => {
            tracing::info!(note_id = updated.id, "note updated");
            Ok(found(NOTES_SUCCESS_URL))
        }
        Ok(None) => Err(AppError::NotFound),
        Err(RepositoryError::SlugTaken(slug)) => Err(AppError::Validation(forms::slug_taken(&slug))),
        Err(e) => Err(e.into()),
    }
}

/// note_delete_page
///
/// [Owner Route] Delete confirmation page.
#[utoipa::path(
    get,
    path = "/delete/{slug}/",
    params(("slug" = String, Path, description = "Note slug")),
    responses((status = 200, description = "Confirm delete", body = Note), (status = 404, description = "Not Found"))
)]
pub async fn note_delete_page(
    Viewer(viewer): Viewer,
    State(state): State<AppState>,
    uri: OriginalUri,
    Path(slug): Path<String>,
) -> Result<Json<Note>, AppError> {
    let note = authorize(viewer.as_ref(), state.repo.get_note(&slug).await, &original_path(&uri.0))?;
    Ok(Json(note))
}

/// note_delete
///
/// [Owner Route] Deletes the note.
#[utoipa::path(
    post,
    path = "/delete/{slug}/",
    params(("slug" = String, Path, description = "Note slug")),
    responses((status = 302, description = "Deleted, redirected to success page"), (status = 404, description = "Not Found"))
)]
pub async fn note_delete(
    Viewer(viewer): Viewer,
    State(state): State<AppState>,
    uri: OriginalUri,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    let note = authorize(viewer.as_ref(), state.repo.get_note(&slug).await, &original_path(&uri.0))?;
    if state.repo.delete_note(&note.slug, note.author_id).await {
        tracing::info!(note_id = note.id, "note deleted");
        Ok(found(NOTES_SUCCESS_URL))
    } else {
        Err(AppError::NotFound)
    }
}

// --- News ---

/// news_home
///
/// [Public Route] The most recent news, newest first, capped at the configured page size.
#[utoipa::path(get, path = "/news/", responses((status = 200, description = "News feed", body = [News])))]
pub async fn news_home(State(state): State<AppState>) -> Json<Vec<News>> {
    let limit = i64::try_from(state.config.news_count_on_home_page).unwrap_or(i64::MAX);
    Json(state.repo.get_home_news(limit).await)
}

/// news_detail
///
/// [Public Route] A news item with its comment thread, oldest comment first.
/// Only authenticated viewers are offered the comment form.
#[utoipa::path(
    get,
    path = "/news/{id}/",
    params(("id" = i64, Path, description = "News ID")),
    responses((status = 200, description = "Found", body = NewsDetail), (status = 404, description = "Not Found"))
)]
pub async fn news_detail(
    Viewer(viewer): Viewer,
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<NewsDetail>, AppError> {
    let id = id_param(id)?;
    let news = state.repo.get_news(id).await.ok_or(AppError::NotFound)?;
    let comments = state.repo.get_comments(id).await;
    Ok(Json(NewsDetail {
        news,
        comments,
        form: viewer.map(|_| CommentForm::default()),
    }))
}

/// comment_create
///
/// [Authenticated Route] Posts a comment on a news item. Anonymous submissions are
/// redirected to login; rejected text leaves the thread untouched.
#[utoipa::path(
    post,
    path = "/news/{id}/",
    params(("id" = i64, Path, description = "News ID")),
    request_body(content = CommentForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Created, redirected to the comment thread"),
        (status = 400, description = "Invalid comment", body = FormErrors),
        (status = 404, description = "Not Found")
    )
)]
pub async fn comment_create(
    AuthUser { id: author_id, .. }: AuthUser,
    State(state): State<AppState>,
    news_id: Result<Path<i64>, PathRejection>,
    payload: Result<Form<CommentForm>, FormRejection>,
) -> Result<Response, AppError> {
    let news_id = id_param(news_id)?;
    let news = state.repo.get_news(news_id).await.ok_or(AppError::NotFound)?;
    let text = forms::validate_comment(submitted(payload)).map_err(AppError::Validation)?;

    let comment = state
        .repo
        .add_comment(news.id, author_id, text, Utc::now())
        .await
        .map_err(|e| match e {
            RepositoryError::MissingReference => AppError::NotFound,
            other => other.into(),
        })?;
    tracing::info!(comment_id = comment.id, news_id = news.id, "comment created");
    Ok(found(&comments_anchor(news.id)))
}

async fn owned_comment(
    state: &AppState,
    viewer: Option<&AuthUser>,
    uri: &OriginalUri,
    id: i64,
) -> Result<Comment, AppError> {
    authorize(viewer, state.repo.get_comment(id).await, &original_path(&uri.0))
}

/// comment_edit_page
///
/// [Owner Route] Edit form prefilled with the comment.
#[utoipa::path(
    get,
    path = "/news/edit_comment/{id}/",
    params(("id" = i64, Path, description = "Comment ID")),
    responses((status = 200, description = "Edit form", body = CommentPage), (status = 404, description = "Not Found"))
)]
pub async fn comment_edit_page(
    Viewer(viewer): Viewer,
    State(state): State<AppState>,
    uri: OriginalUri,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<CommentPage>, AppError> {
    let comment = owned_comment(&state, viewer.as_ref(), &uri, id_param(id)?).await?;
    Ok(Json(CommentPage {
        form: CommentForm {
            text: comment.text.clone(),
        },
        comment,
    }))
}

/// comment_edit
///
/// [Owner Route] Replaces the comment text in place.
#[utoipa::path(
    post,
    path = "/news/edit_comment/{id}/",
    params(("id" = i64, Path, description = "Comment ID")),
    request_body(content = CommentForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Updated, redirected to the comment thread"),
        (status = 400, description = "Invalid comment", body = FormErrors),
        (status = 404, description = "Not Found")
    )
)]
pub async fn comment_edit(
    Viewer(viewer): Viewer,
    State(state): State<AppState>,
    uri: OriginalUri,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Form<CommentForm>, FormRejection>,
) -> Result<Response, AppError> {
    let comment = owned_comment(&state, viewer.as_ref(), &uri, id_param(id)?).await?;
    let text = forms::validate_comment(submitted(payload)).map_err(AppError::Validation)?;

    let updated = state
        .repo
        .update_comment(comment.id, comment.author_id, text)
        .await
        .ok_or(AppError::NotFound)?;
    tracing::info!(comment_id = updated.id, "comment updated");
    Ok(found(&comments_anchor(updated.news_id)))
}

/// comment_delete_page
///
/// [Owner Route] Delete confirmation page.
#[utoipa::path(
    get,
    path = "/news/delete_comment/{id}/",
    params(("id" = i64, Path, description = "Comment ID")),
    responses((status = 200, description = "Confirm delete", body = CommentPage), (status = 404, description = "Not Found"))
)]
pub async fn comment_delete_page(
    Viewer(viewer): Viewer,
    State(state): State<AppState>,
    uri: OriginalUri,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<CommentPage>, AppError> {
    let comment = owned_comment(&state, viewer.as_ref(), &uri, id_param(id)?).await?;
    Ok(Json(CommentPage {
        form: CommentForm {
            text: comment.text.clone(),
        },
        comment,
    }))
}

/// comment_delete
///
/// [Owner Route] Deletes the comment. Accepts both POST (form) and DELETE.
#[utoipa::path(
    delete,
    path = "/news/delete_comment/{id}/",
    params(("id" = i64, Path, description = "Comment ID")),
    responses(
        (status = 302, description = "Deleted, redirected to the comment thread"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn comment_delete(
    Viewer(viewer): Viewer,
    State(state): State<AppState>,
    uri: OriginalUri,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Response, AppError> {
    let comment = owned_comment(&state, viewer.as_ref(), &uri, id_param(id)?).await?;
    if state.repo.delete_comment(comment.id, comment.author_id).await {
        tracing::info!(comment_id = comment.id, "comment deleted");
        Ok(found(&comments_anchor(comment.news_id)))
    } else {
        Err(AppError::NotFound)
    }
}

/// health
///
/// [Public Route] Liveness probe.
pub async fn health() -> impl IntoResponse {
    "ok"
}
