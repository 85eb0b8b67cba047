use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Stored Entities (Mapped to Database) ---

/// User
///
/// The canonical account row from the `users` table.
///
/// No `Serialize` impl: the row carries the password hash. API payloads go through
/// the `SessionUser` projection.
#[derive(Clone, FromRow, Default)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    // bcrypt hash; absent for accounts created through an external provider.
    pub password: Option<String>,
    // RBAC field: 'user' or 'admin'.
    pub role: String,
    pub preferred_language: String,
    pub daily_goal: i32,
    pub user_level: String,
    pub default_category: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("role", &self.role)
            .field("preferred_language", &self.preferred_language)
            .field("daily_goal", &self.daily_goal)
            .field("user_level", &self.user_level)
            .field("default_category", &self.default_category)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Subscription
///
/// Billing state from the `subscriptions` table. At most one per user.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan: String,
    pub status: String,
    #[ts(type = "string | null")]
    pub current_period_end: Option<DateTime<Utc>>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// UserWithSubscription
///
/// Result of the refresh-session lookup: the account and its optional subscription.
#[derive(Debug, Clone, Default)]
pub struct UserWithSubscription {
    pub user: User,
    pub subscription: Option<Subscription>,
}

/// Word
///
/// A vocabulary entry owned by a single user, bucketed by proficiency `level` (1..=5).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Word {
    pub id: Uuid,
    pub user_id: Uuid,
    pub term: String,
    pub translation: String,
    pub language: String,
    pub level: i32,
    #[ts(type = "string")]
    pub last_reviewed: DateTime<Utc>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Tag
///
/// A label attached to words through the `word_tags` join table.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
}

/// WordWithTags
///
/// A word plus its tags. Serialized flat, so the JSON looks like a `Word` with a `tags` array.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct WordWithTags {
    #[serde(flatten)]
    pub word: Word,
    pub tags: Vec<Tag>,
}

/// Feedback
///
/// A feedback message submitted by a user.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Feedback {
    pub id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub rating: Option<i32>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

// --- Validated Inputs ---

/// WordLevel
///
/// A proficiency bucket. Only values 1 through 5 can be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordLevel(i32);

impl WordLevel {
    pub const MIN: i32 = 1;
    pub const MAX: i32 = 5;

    /// Parses a raw path segment. Anything other than a plain decimal integer in range is
    /// rejected, including surrounding whitespace and trailing garbage.
    pub fn parse(raw: &str) -> Option<Self> {
        raw.parse::<i32>().ok().and_then(|n| Self::try_from(n).ok())
    }

    pub fn value(self) -> i32 {
        self.0
    }
}

impl TryFrom<i32> for WordLevel {
    type Error = i32;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(WordLevel(value))
        } else {
            Err(value)
        }
    }
}

// --- Response Payloads (Output Schemas) ---

/// SessionUser
///
/// The allow-listed view of a `User` returned by the refresh-session endpoint.
/// There is no password field, so a hash can never be serialized from here.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: String,
    pub subscription: Option<Subscription>,
    pub preferred_language: String,
    pub daily_goal: i32,
    pub user_level: String,
    pub default_category: Option<String>,
}

impl From<UserWithSubscription> for SessionUser {
    fn from(UserWithSubscription { user, subscription }: UserWithSubscription) -> Self {
        SessionUser {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            subscription,
            preferred_language: user.preferred_language,
            daily_goal: user.daily_goal,
            user_level: user.user_level,
            default_category: user.default_category,
        }
    }
}

/// RefreshSessionResponse
///
/// Output schema for `POST /api/auth/refresh-session`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct RefreshSessionResponse {
    pub success: bool,
    pub user: SessionUser,
}
