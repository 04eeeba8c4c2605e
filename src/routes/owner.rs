use crate::{AppState, handlers};
use axum::{
    Router,
    routing::get,
};

/// Owner Router Module
///
/// Routes addressing a single note (by slug) or comment (by id). Every handler
/// loads the resource and passes it through `access::authorize`:
/// - anonymous viewer: redirect to login with `next`
/// - authenticated non-author: 404, exactly like a missing resource
/// - author: the request proceeds
pub fn owner_routes() -> Router<AppState> {
    Router::new()
        // --- Notes ---
        .route("/note/{slug}/", get(handlers::note_detail))
        .route(
            "/edit/{slug}/",
            get(handlers::note_edit_page).post(handlers::note_edit),
        )
        .route(
            "/delete/{slug}/",
            get(handlers::note_delete_page).post(handlers::note_delete),
        )
        // --- Comments ---
        // Successful edits and deletes redirect to /news/{news_id}/#comments.
        .route(
            "/news/edit_comment/{id}/",
            get(handlers::comment_edit_page).post(handlers::comment_edit),
        )
        .route(
            "/news/delete_comment/{id}/",
            get(handlers::comment_delete_page)
                .post(handlers::comment_delete)
                .delete(handlers::comment_delete),
        )
}
