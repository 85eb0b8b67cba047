use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";
pub const INTERNAL_MESSAGE: &str = "Internal server error";

/// ApiError
///
/// Every failure a route can produce. Each variant maps to exactly one status code, and the
/// client only ever sees the `{ "error": string }` envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(&'static str),

    /// Storage or other unexpected failure. The source is logged, never returned.
    #[error("internal error: {0}")]
    Internal(#[from] sqlx::Error),
}

/// ErrorBody
///
/// JSON envelope shared by every non-2xx response.
#[derive(Debug, Clone, Serialize, serde::Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message that is safe to hand to the client.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Internal(_) => INTERNAL_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(source) = &self {
            tracing::error!(error = ?source, "request failed");
        }

        let body = ErrorBody {
            error: self.public_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
