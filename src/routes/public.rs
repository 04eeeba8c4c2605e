use crate::{AppState, handlers};
use axum::{
    Router,
    routing::get,
};

/// Public Router Module
///
/// Pages any client may load (anonymous or logged-in): the two home pages, the
/// auth gateway pages and the news detail page.
///
/// `POST /news/{id}/` shares its path with the public detail page, so it is
/// registered here. The handler takes `AuthUser`, which redirects anonymous
/// submissions to login before any comment is written.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(handlers::health))
        // GET /
        // Notes landing page.
        .route("/", get(handlers::home))
        // GET/POST /auth/login/?next=...
        // Login form; a successful POST sets the session cookie and follows `next`.
        .route(
            "/auth/login/",
            get(handlers::login_page).post(handlers::login),
        )
        // GET/POST /auth/logout/
        .route(
            "/auth/logout/",
            get(handlers::logout).post(handlers::logout),
        )
        // GET/POST /auth/signup/
        .route(
            "/auth/signup/",
            get(handlers::signup_page).post(handlers::signup),
        )
        // GET /news/
        // News feed, newest first, capped at NEWS_COUNT_ON_HOME_PAGE.
        .route("/news/", get(handlers::news_home))
        // GET /news/{id}/  : detail with comments (form only for logged-in viewers)
        // POST /news/{id}/ : post a comment (login required)
        .route(
            "/news/{id}/",
            get(handlers::news_detail).post(handlers::comment_create),
        )
}
