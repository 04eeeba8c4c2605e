//! Ownership gating shared by notes and comments.
//!
//! A viewer may see an owner-only page, or mutate a resource, only when they
//! are its author. Everyone else is told the resource does not exist.

use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::AppError,
    models::{Comment, Note},
};

/// Anything with an immutable author reference.
pub trait Owned {
    fn author_id(&self) -> Uuid;
}

impl Owned for Note {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

impl Owned for Comment {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

/// Outcome of [`check_ownership`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    /// Authenticated, but not the author. Reported as 404.
    DenyNotFound,
    /// Anonymous. Sent to login.
    DenyRedirect,
}

/// check_ownership
///
/// The single authorization predicate for owner-only routes.
pub fn check_ownership<R: Owned + ?Sized>(viewer: Option<&AuthUser>, resource: &R) -> Access {
    match viewer {
        None => Access::DenyRedirect,
        Some(user) if user.id == resource.author_id() => Access::Allow,
        Some(_) => Access::DenyNotFound,
    }
}

/// authorize
///
/// Applies [`check_ownership`] to an optional lookup result. A missing resource and
/// a resource owned by someone else are indistinguishable to the caller.
/// `next` is the original request path, used when the viewer is anonymous.
pub fn authorize<R: Owned>(
    viewer: Option<&AuthUser>,
    resource: Option<R>,
    next: &str,
) -> Result<R, AppError> {
    let Some(resource) = resource else {
        return match viewer {
            None => Err(AppError::login_required(next)),
            Some(_) => Err(AppError::NotFound),
        };
    };
    match check_ownership(viewer, &resource) {
        Access::Allow => Ok(resource),
        Access::DenyNotFound => Err(AppError::NotFound),
        Access::DenyRedirect => Err(AppError::login_required(next)),
    }
}
