use axum::{
    Router,
    extract::{FromRef, Request},
    http::{HeaderName, HeaderValue, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod admin;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod ui;

// Routing split by access level (public, authenticated).
pub mod routes;
use auth::Identity;
use error::ApiError;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{PostgresRepository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document for the JSON API, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::refresh_session,
        handlers::get_my_feedbacks,
        handlers::get_words_by_level,
    ),
    components(
        schemas(
            models::RefreshSessionResponse, models::SessionUser, models::Subscription,
            models::Feedback, models::Word, models::Tag, models::WordWithTags,
            error::ErrorBody,
        )
    ),
    tags(
        (name = "lingo", description = "Language learning portal API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, cheaply clonable application state: the repository handle and the immutable
/// configuration.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: all database access goes through here.
    pub repo: RepositoryState,
    /// Configuration loaded at startup.
    pub config: AppConfig,
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

/// require_session
///
/// The authorization gate for `authenticated_routes`.
///
/// Anonymous requests are answered with 401 `{"error":"Unauthorized"}` here, so the handler
/// and every repository call behind it are skipped. Authenticated requests continue with the
/// resolved `AuthUser` stored in the request extensions for the handler's extractor.
async fn require_session(identity: Identity, mut request: Request, next: Next) -> Response {
    match identity.into_auth_user() {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => ApiError::Unauthorized.into_response(),
    }
}

/// Private cache header for successful API responses only; errors are never cached.
fn client_cache_control(response: &Response) -> Option<HeaderValue> {
    response
        .status()
        .is_success()
        .then(|| HeaderValue::from_static(ui::shell::CLIENT_CACHE_CONTROL))
}

/// create_router
///
/// Assembles routing, the authorization gate, and the observability layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        // The gate is added last so it runs first; the cache header only wraps handlers it admits.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(SetResponseHeaderLayer::if_not_present(
                    header::CACHE_CONTROL,
                    client_cache_control,
                ))
                .route_layer(middleware::from_fn_with_state(state.clone(), require_session)),
        )
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
/// Span per request carrying method, path, and the generated `x-request-id`, so every log line
/// of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri().path(),
        req_id = %request_id,
    )
}
