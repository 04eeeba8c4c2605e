use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use thiserror::Error;

use crate::{config::LOGIN_URL, forms::FormErrors, repository::RepositoryError};

// Characters left literal in the `next` parameter; everything else is escaped.
const NEXT_PARAM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// AppError
///
/// Every way a request can be refused. Each variant maps to exactly one
/// well-formed response, so nothing escapes the request boundary.
#[derive(Debug, Error)]
pub enum AppError {
    /// Anonymous viewer on a private route.
    #[error("authentication required to access {next}")]
    LoginRequired { next: String },

    /// Missing resource, or a resource the viewer does not own.
    #[error("not found")]
    NotFound,

    /// Form submission rejected; nothing was written.
    #[error("validation failed")]
    Validation(FormErrors),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn login_required(next: impl Into<String>) -> Self {
        AppError::LoginRequired { next: next.into() }
    }
}

impl From<RepositoryError> for AppError {
    fn from(error: RepositoryError) -> Self {
        AppError::Internal(error.to_string())
    }
}

/// login_redirect_url
///
/// Builds `LOGIN_URL?next=<path>` with `/` kept literal in the escaped path.
pub fn login_redirect_url(next: &str) -> String {
    format!("{}?next={}", LOGIN_URL, utf8_percent_encode(next, NEXT_PARAM))
}

/// found
///
/// A 302 redirect, the status browsers and form-based clients expect after a POST.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::LoginRequired { next } => {
                tracing::debug!(%next, "anonymous viewer redirected to login");
                found(&login_redirect_url(&next))
            }
            AppError::NotFound => StatusCode::NOT_FOUND.into_response(),
            AppError::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            AppError::Internal(message) => {
                tracing::error!("request failed: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}
