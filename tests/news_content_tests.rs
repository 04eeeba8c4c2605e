mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{create_news, create_news_feed, create_user, get, json, send, test_state};
use ya_portal::{
    config::DEFAULT_NEWS_COUNT_ON_HOME_PAGE,
    models::{News, NewsDetail},
};

#[tokio::test]
async fn test_news_count() {
    let state = test_state();
    create_news_feed(&state, DEFAULT_NEWS_COUNT_ON_HOME_PAGE + 1).await;

    let object_list: Vec<News> = json(send(&state, get("/news/", None)).await).await;

    assert_eq!(object_list.len(), DEFAULT_NEWS_COUNT_ON_HOME_PAGE);
}

#[tokio::test]
async fn test_news_count_below_page_size() {
    let state = test_state();
    create_news_feed(&state, 3).await;

    let object_list: Vec<News> = json(send(&state, get("/news/", None)).await).await;

    assert_eq!(object_list.len(), 3);
}

#[tokio::test]
async fn test_news_count_follows_config() {
    let mut state = test_state();
    state.config.news_count_on_home_page = 4;
    create_news_feed(&state, 6).await;

    let object_list: Vec<News> = json(send(&state, get("/news/", None)).await).await;

    assert_eq!(object_list.len(), 4);
}

#[tokio::test]
async fn test_news_order() {
    let state = test_state();
    create_news_feed(&state, DEFAULT_NEWS_COUNT_ON_HOME_PAGE + 1).await;

    let object_list: Vec<News> = json(send(&state, get("/news/", None)).await).await;

    let all_dates: Vec<_> = object_list.iter().map(|news| news.date).collect();
    let mut sorted_dates = all_dates.clone();
    sorted_dates.sort_by(|a, b| b.cmp(a));
    assert_eq!(all_dates, sorted_dates);
    // The oldest item is the one cut off by the page size.
    assert_eq!(all_dates[0], Utc::now().date_naive());
}

#[tokio::test]
async fn test_comments_order() {
    let state = test_state();
    let news = create_news(&state).await;
    let author = create_user(&state, "Автор").await;
    let now = Utc::now();
    // Inserted newest first so the thread order cannot come from insertion order.
    for index in (0..2).rev() {
        state
            .repo
            .add_comment(news.id, author.id, format!("Tекст {index}"), now + Duration::days(index))
            .await
            .unwrap();
    }

    let response = send(&state, get(&format!("/news/{}/", news.id), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let detail: NewsDetail = json(response).await;

    assert_eq!(detail.news, news);
    let all_comments = detail.comments;
    assert_eq!(all_comments.len(), 2);
    assert!(all_comments[0].created < all_comments[1].created);
    assert_eq!(all_comments[0].author_username.as_deref(), Some("Автор"));
}

#[tokio::test]
async fn test_comments_with_same_timestamp_keep_creation_order() {
    let state = test_state();
    let news = create_news(&state).await;
    let author = create_user(&state, "Автор").await;
    let now = Utc::now();
    for index in 0..3 {
        state
            .repo
            .add_comment(news.id, author.id, format!("Tекст {index}"), now)
            .await
            .unwrap();
    }

    let detail: NewsDetail =
        json(send(&state, get(&format!("/news/{}/", news.id), None)).await).await;

    let ids: Vec<i64> = detail.comments.iter().map(|comment| comment.id).collect();
    let mut sorted_ids = ids.clone();
    sorted_ids.sort();
    assert_eq!(ids, sorted_ids);
}

#[tokio::test]
async fn test_comment_form_for_different_users() {
    let state = test_state();
    let news = create_news(&state).await;
    let author = create_user(&state, "Автор").await;
    let url = format!("/news/{}/", news.id);

    for (user, comment_in_list) in [(Some(&author), true), (None, false)] {
        let detail: NewsDetail = json(send(&state, get(&url, user)).await).await;
        assert_eq!(detail.form.is_some(), comment_in_list);
    }
}

#[tokio::test]
async fn test_missing_news_is_not_found() {
    let state = test_state();

    let response = send(&state, get("/news/999/", None)).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
