use crate::{AppState, handlers};
use axum::{
    Router,
    routing::get,
};

/// Authenticated Router Module
///
/// Notes pages available to any logged-in user. This router is wrapped in the
/// `auth_middleware` layer, so anonymous requests are redirected to login
/// before a handler runs.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /notes/
        // The viewer's own notes.
        .route("/notes/", get(handlers::notes_list))
        // GET/POST /add/
        // Note form; a successful POST redirects to /done/.
        .route(
            "/add/",
            get(handlers::note_add_page).post(handlers::note_add),
        )
        // GET /done/
        // Confirmation page after any note mutation.
        .route("/done/", get(handlers::note_success))
}
