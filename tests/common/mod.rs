//! Setup helpers shared by the integration tests.
//!
//! Every helper builds fresh state: each test gets its own in-memory repository,
//! so no test can observe another's users, notes or comments.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response, header},
};
use chrono::{Duration, Utc};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::de::DeserializeOwned;
use tower::ServiceExt;
use ya_portal::{
    AppConfig, AppState, InMemoryRepository, create_router,
    models::{Comment, NewNews, NewNote, News, Note, User},
};

pub fn test_state() -> AppState {
    AppState::new(Arc::new(InMemoryRepository::new()), AppConfig::default())
}

pub fn router(state: &AppState) -> Router {
    create_router(state.clone())
}

pub async fn create_user(state: &AppState, username: &str) -> User {
    state.repo.create_user(username).await.unwrap()
}

pub async fn create_note(state: &AppState, author: &User, slug: &str) -> Note {
    state
        .repo
        .create_note(
            NewNote {
                title: "Заголовок".to_string(),
                text: "Текст".to_string(),
                slug: slug.to_string(),
            },
            author.id,
        )
        .await
        .unwrap()
}

pub async fn create_news(state: &AppState) -> News {
    state
        .repo
        .create_news(NewNews {
            title: "Заголовок".to_string(),
            text: "Текст".to_string(),
            date: Utc::now().date_naive(),
        })
        .await
        .unwrap()
}

/// `count` news items dated today, yesterday, and so on.
pub async fn create_news_feed(state: &AppState, count: usize) -> Vec<News> {
    let today = Utc::now().date_naive();
    let feed = (0..count)
        .map(|index| NewNews {
            title: format!("Новость {index}"),
            text: "Просто текст.".to_string(),
            date: today - Duration::days(index as i64),
        })
        .collect();
    state.repo.bulk_create_news(feed).await.unwrap()
}

pub async fn create_comment(state: &AppState, news: &News, author: &User) -> Comment {
    state
        .repo
        .add_comment(news.id, author.id, "Текст".to_string(), Utc::now())
        .await
        .unwrap()
}

// --- Requests ---

pub fn request(method: Method, uri: &str, as_user: Option<&User>, form: Option<&[(&str, &str)]>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = as_user {
        // Local-mode login bypass.
        builder = builder.header("x-user-id", user.id.to_string());
    }
    match form {
        Some(fields) => builder
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form_body(fields)))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn get(uri: &str, as_user: Option<&User>) -> Request<Body> {
    request(Method::GET, uri, as_user, None)
}

pub fn post(uri: &str, as_user: Option<&User>, form: &[(&str, &str)]) -> Request<Body> {
    request(Method::POST, uri, as_user, Some(form))
}

pub fn form_body(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(key, NON_ALPHANUMERIC),
                utf8_percent_encode(value, NON_ALPHANUMERIC)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

pub async fn send(state: &AppState, request: Request<Body>) -> Response<Body> {
    router(state).oneshot(request).await.unwrap()
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("response has no Location header")
        .to_str()
        .unwrap()
        .to_string()
}

pub async fn json<T: DeserializeOwned>(response: Response<Body>) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
