use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult, ErrorBody},
    models::{Feedback, RefreshSessionResponse, SessionUser, WordLevel, WordWithTags},
};
use axum::{
    Json,
    extract::{Path, State},
};

pub const USER_NOT_FOUND: &str = "User not found";
pub const INVALID_LEVEL: &str = "Invalid level. Must be between 1 and 5";

/// refresh_session
///
/// [Authenticated Route] Re-reads the caller's account and subscription so the client can
/// update its session copy after profile or billing changes.
///
/// The payload is the `SessionUser` projection; the stored password hash never leaves the
/// repository layer.
#[utoipa::path(
    post,
    path = "/api/auth/refresh-session",
    responses(
        (status = 200, description = "Fresh session data", body = RefreshSessionResponse),
        (status = 401, description = "No valid session", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub async fn refresh_session(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<RefreshSessionResponse>> {
    let record = state
        .repo
        .get_user_with_subscription(id)
        .await?
        .ok_or(ApiError::NotFound(USER_NOT_FOUND))?;

    tracing::debug!(user_id = %id, "session refreshed");

    Ok(Json(RefreshSessionResponse {
        success: true,
        user: SessionUser::from(record),
    }))
}

/// get_my_feedbacks
///
/// [Authenticated Route] Lists the caller's feedback, newest first.
#[utoipa::path(
    get,
    path = "/api/feedback/my-feedbacks",
    responses(
        (status = 200, description = "My feedback", body = [Feedback]),
        (status = 401, description = "No valid session", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub async fn get_my_feedbacks(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Feedback>>> {
    let feedback = state.repo.get_feedback_for_user(id).await?;
    Ok(Json(feedback))
}

/// get_words_by_level
///
/// [Authenticated Route] Lists the caller's words in one proficiency bucket, including tags,
/// least recently reviewed first.
///
/// The level is taken as a raw string so that malformed values produce our own 400 envelope
/// instead of the framework's path rejection.
#[utoipa::path(
    get,
    path = "/api/words/by-level/{level}",
    params(("level" = String, Path, description = "Proficiency level, 1 to 5")),
    responses(
        (status = 200, description = "Words at this level", body = [WordWithTags]),
        (status = 400, description = "Level out of range or not an integer", body = ErrorBody),
        (status = 401, description = "No valid session", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub async fn get_words_by_level(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(level): Path<String>,
) -> ApiResult<Json<Vec<WordWithTags>>> {
    let level = WordLevel::parse(&level).ok_or(ApiError::Validation(INVALID_LEVEL))?;
    let words = state.repo.get_words_by_level(id, level).await?;
    Ok(Json(words))
}
