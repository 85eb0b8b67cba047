use crate::models::{Feedback, Subscription, Tag, User, UserWithSubscription, Word, WordLevel, WordWithTags};
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use std::{collections::HashMap, sync::Arc};
use uuid::Uuid;

/// Repository Trait
///
/// The persistence contract used by the handlers, the session resolver and the admin CLI.
///
/// Every method that returns user-owned data takes the owner id as a required argument and
/// filters on it in SQL; there is no unscoped variant to reach for by mistake.
///
/// Errors are returned rather than swallowed so the handlers can turn them into a 500.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Session ---
    /// Role lookup used by the local `x-user-id` bypass.
    async fn get_user_role(&self, id: Uuid) -> sqlx::Result<Option<String>>;
    async fn get_user_with_subscription(&self, id: Uuid) -> sqlx::Result<Option<UserWithSubscription>>;

    // --- Owner-scoped reads ---
    /// Feedback written by `user_id`, newest first.
    async fn get_feedback_for_user(&self, user_id: Uuid) -> sqlx::Result<Vec<Feedback>>;
    /// Words owned by `user_id` at exactly `level`, least recently reviewed first.
    async fn get_words_by_level(&self, user_id: Uuid, level: WordLevel) -> sqlx::Result<Vec<WordWithTags>>;

    // --- Administration ---
    async fn find_user_by_email(&self, email: &str) -> sqlx::Result<Option<User>>;
    /// Replaces the stored hash. Returns false when no row matched.
    async fn set_password_hash(&self, user_id: Uuid, password_hash: &str) -> sqlx::Result<bool>;
}

/// RepositoryState
///
/// The shared handle stored in `AppState`.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = r#"
    id, email, name, password, role, preferred_language, daily_goal,
    user_level, default_category, created_at
"#;

/// Tag row joined with the id of the word it belongs to.
#[derive(Debug, Clone, FromRow)]
pub struct WordTagRow {
    pub word_id: Uuid,
    pub id: Uuid,
    pub name: String,
}

/// attach_tags
///
/// Pairs each word with its tags, keeping the order of `words`. Words with no tag rows get
/// an empty list.
pub fn attach_tags(words: Vec<Word>, tag_rows: Vec<WordTagRow>) -> Vec<WordWithTags> {
    let mut by_word: HashMap<Uuid, Vec<Tag>> = HashMap::new();
    for row in tag_rows {
        by_word.entry(row.word_id).or_default().push(Tag {
            id: row.id,
            name: row.name,
        });
    }

    words
        .into_iter()
        .map(|word| {
            let tags = by_word.remove(&word.id).unwrap_or_default();
            WordWithTags { word, tags }
        })
        .collect()
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user_role(&self, id: Uuid) -> sqlx::Result<Option<String>> {
        sqlx::query_scalar::<_, String>("SELECT role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// get_user_with_subscription
    ///
    /// Two point lookups on primary/unique keys; the subscription is optional.
    async fn get_user_with_subscription(&self, id: Uuid) -> sqlx::Result<Option<UserWithSubscription>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let Some(user) = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            SELECT id, user_id, plan, status, current_period_end, created_at
            FROM subscriptions
            WHERE user_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(Some(UserWithSubscription { user, subscription }))
    }

    async fn get_feedback_for_user(&self, user_id: Uuid) -> sqlx::Result<Vec<Feedback>> {
        sqlx::query_as::<_, Feedback>(
            r#"
            SELECT id, user_id, message, rating, created_at
            FROM feedback
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    /// get_words_by_level
    ///
    /// Loads the matching words, then all their tags in one `ANY($1)` query, and stitches the
    /// two together in memory.
    async fn get_words_by_level(&self, user_id: Uuid, level: WordLevel) -> sqlx::Result<Vec<WordWithTags>> {
        let words = sqlx::query_as::<_, Word>(
            r#"
            SELECT id, user_id, term, translation, language, level, last_reviewed, created_at
            FROM words
            WHERE user_id = $1 AND level = $2
            ORDER BY last_reviewed ASC
            "#,
        )
        .bind(user_id)
        .bind(level.value())
        .fetch_all(&self.pool)
        .await?;

        if words.is_empty() {
            return Ok(Vec::new());
        }

        let word_ids: Vec<Uuid> = words.iter().map(|w| w.id).collect();
        let tag_rows = sqlx::query_as::<_, WordTagRow>(
            r#"
            SELECT wt.word_id, t.id, t.name
            FROM word_tags wt
            JOIN tags t ON t.id = wt.tag_id
            WHERE wt.word_id = ANY($1)
            ORDER BY t.name ASC
            "#,
        )
        .bind(&word_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(attach_tags(words, tag_rows))
    }

    async fn find_user_by_email(&self, email: &str) -> sqlx::Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    async fn set_password_hash(&self, user_id: Uuid, password_hash: &str) -> sqlx::Result<bool> {
        let result = sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
