use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Every route here reads data owned by the caller. The router is wrapped in the
/// authorization gate by `create_router`; handlers take the resolved `AuthUser` and pass its
/// id into the repository, which filters on it.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /api/auth/refresh-session
        // Re-reads the caller's profile and subscription for the client session copy.
        .route("/api/auth/refresh-session", post(handlers::refresh_session))
        // GET /api/feedback/my-feedbacks
        // The caller's feedback, newest first.
        .route("/api/feedback/my-feedbacks", get(handlers::get_my_feedbacks))
        // GET /api/words/by-level/{level}
        // The caller's words in one proficiency bucket (1-5), with tags.
        .route("/api/words/by-level/{level}", get(handlers::get_words_by_level))
}
