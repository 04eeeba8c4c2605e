use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod access;
pub mod auth;
pub mod config;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod repository;

// Routers grouped by access tier (public, authenticated, owner).
pub mod routes;
use auth::AuthUser;
use routes::{authenticated, owner, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use memory::InMemoryRepository;
pub use repository::{PostgresRepository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document for every route, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::home, handlers::login_page, handlers::login, handlers::logout,
        handlers::signup_page, handlers::signup, handlers::notes_list, handlers::note_add_page,
        handlers::note_add, handlers::note_success, handlers::note_detail,
        handlers::note_edit_page, handlers::note_edit, handlers::note_delete_page,
        handlers::note_delete, handlers::news_home, handlers::news_detail,
        handlers::comment_create, handlers::comment_edit_page, handlers::comment_edit,
        handlers::comment_delete_page, handlers::comment_delete
    ),
    components(
        schemas(
            models::User, models::Note, models::News, models::Comment, models::NoteForm,
            models::CommentForm, models::CredentialsForm, models::Page, models::NoteFormPage,
            models::NewsDetail, models::CommentPage, forms::FormErrors,
        )
    ),
    tags(
        (name = "ya-portal", description = "Notes and news service")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, immutable state handed to every request.
#[derive(Clone)]
pub struct AppState {
    /// Persistence layer (Postgres or in-memory).
    pub repo: RepositoryState,
    /// The loaded configuration.
    pub config: AppConfig,
}

impl AppState {
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        Self { repo, config }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Gate for `authenticated_routes`. Extracting `AuthUser` either succeeds or
/// rejects with a redirect to login carrying the original path as `next`.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles all routes, the auth layer and the observability stack.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .merge(owner::owner_routes())
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one HTTP request, tagged with the `x-request-id` so every log line of
/// the request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
