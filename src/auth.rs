use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::ApiError,
    repository::{Repository, RepositoryState},
};

/// Name of the cookie that may carry the session token instead of the `Authorization` header.
pub const SESSION_COOKIE: &str = "session";

/// Header honoured only in `Env::Local` to impersonate an existing user.
pub const DEV_USER_HEADER: &str = "x-user-id";

/// Claims
///
/// Payload of a session token. Signed with `AppConfig::session_secret` (HS256).
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: Uuid,
    /// Role at the time the token was issued.
    pub role: String,
    /// Expiration time (seconds since epoch).
    pub exp: usize,
    /// Issued at (seconds since epoch).
    pub iat: usize,
}

/// AuthUser
///
/// The identity handed to protected handlers once the gate has let a request through.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: String,
}

/// Identity
///
/// Outcome of session resolution. `Anonymous` is a normal result, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Identity {
    Authenticated { id: Uuid, role: String },
    Anonymous,
}

impl Identity {
    pub fn into_auth_user(self) -> Option<AuthUser> {
        match self {
            Identity::Authenticated { id, role } => Some(AuthUser { id, role }),
            Identity::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::Authenticated { .. })
    }
}

/// issue_token
///
/// Signs a session token for `id` valid for `ttl`. Used by the admin CLI and tests.
pub fn issue_token(
    secret: &str,
    id: Uuid,
    role: &str,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    // Clamped to the latest representable instant.
    let expires = now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
    let claims = Claims {
        sub: id,
        role: role.to_string(),
        iat: now.timestamp().max(0) as usize,
        exp: expires.timestamp().max(0) as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
}

/// decode_token
///
/// Verifies signature and expiry. Any failure yields `None`; the reason is logged at debug.
pub fn decode_token(secret: &str, token: &str) -> Option<Claims> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    match decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation) {
        Ok(data) => Some(data.claims),
        Err(e) => {
            match e.kind() {
                ErrorKind::ExpiredSignature => tracing::debug!("session token expired"),
                other => tracing::debug!(reason = ?other, "session token rejected"),
            }
            None
        }
    }
}

/// Bearer token from `Authorization`, falling back to the session cookie.
fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string);

    bearer.or_else(|| {
        CookieJar::from_headers(headers)
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
    })
}

/// resolve_session
///
/// Turns request headers into an `Identity`.
///
/// 1. Local bypass: in `Env::Local`, a valid `x-user-id` naming an existing user wins.
/// 2. Session token: bearer header or `session` cookie, verified against the session secret.
///
/// Storage is only touched by the local bypass, and only when the header is present. A failed
/// bypass lookup is an `Internal` error, not a silent downgrade to `Anonymous`.
pub async fn resolve_session(
    headers: &HeaderMap,
    repo: &dyn Repository,
    config: &AppConfig,
) -> Result<Identity, ApiError> {
    if config.env == Env::Local {
        let dev_user = headers
            .get(DEV_USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| Uuid::parse_str(raw).ok());

        if let Some(user_id) = dev_user {
            match repo.get_user_role(user_id).await? {
                Some(role) => return Ok(Identity::Authenticated { id: user_id, role }),
                None => tracing::debug!(%user_id, "dev bypass user not found"),
            }
        }
    }

    let Some(token) = session_token(headers) else {
        return Ok(Identity::Anonymous);
    };

    Ok(match decode_token(&config.session_secret, &token) {
        Some(claims) => Identity::Authenticated {
            id: claims.sub,
            role: claims.role,
        },
        None => Identity::Anonymous,
    })
}

/// Identity extractor
///
/// Used by routes that render differently for signed-in users (the page shell) and by the
/// authorization gate. Missing or invalid credentials yield `Anonymous`; only a storage
/// failure during the local bypass rejects.
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);
        resolve_session(&parts.headers, repo.as_ref(), &config).await
    }
}

/// AuthUser extractor
///
/// Reuses the identity the authorization gate stored in the request extensions. Outside the
/// gate it resolves the session itself and rejects anonymous callers with 401.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);
        resolve_session(&parts.headers, repo.as_ref(), &config)
            .await?
            .into_auth_user()
            .ok_or(ApiError::Unauthorized)
    }
}
