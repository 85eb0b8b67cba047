use crate::{AppState, ui::shell};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints that need no session. None of them read user-owned data; the page shell only
/// embeds the caller's own session hint when one resolves.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /
        // The HTML document the browser client boots from.
        .route("/", get(shell::index))
        // GET /dashboard/...
        // Client-side routes; the browser app picks the view from the URL.
        .route("/dashboard/{*path}", get(shell::index))
        // GET /learn
        // Old location of the learning page; always forwards to the dashboard.
        .route(shell::LEGACY_PATH, get(shell::legacy_redirect))
}
