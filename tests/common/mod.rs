#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use lingo_portal::{
    AppState,
    auth::issue_token,
    config::{AppConfig, Env},
    create_router,
    models::{Feedback, Subscription, Tag, User, UserWithSubscription, Word, WordLevel, WordWithTags},
    repository::Repository,
};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use tower::ServiceExt;
use uuid::Uuid;

pub const USER_A: Uuid = Uuid::from_u128(0xA);
pub const USER_B: Uuid = Uuid::from_u128(0xB);

// --- In-Memory Repository ---

/// Repository double that applies the same owner filters and orderings as the SQL queries,
/// and counts every call so tests can assert that no data access happened.
#[derive(Default)]
pub struct InMemoryRepo {
    pub users: Mutex<Vec<User>>,
    pub subscriptions: Vec<Subscription>,
    pub words: Vec<WordWithTags>,
    pub feedback: Vec<Feedback>,
    /// When set, every call fails as if the pool were exhausted.
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl InMemoryRepo {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) -> sqlx::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(sqlx::Error::PoolTimedOut)
        } else {
            Ok(())
        }
    }

    pub fn user(&self, id: Uuid) -> Option<User> {
        self.users.lock().unwrap().iter().find(|u| u.id == id).cloned()
    }
}

#[async_trait]
impl Repository for InMemoryRepo {
    async fn get_user_role(&self, id: Uuid) -> sqlx::Result<Option<String>> {
        self.record()?;
        Ok(self.user(id).map(|u| u.role))
    }

    async fn get_user_with_subscription(&self, id: Uuid) -> sqlx::Result<Option<UserWithSubscription>> {
        self.record()?;
        Ok(self.user(id).map(|user| UserWithSubscription {
            subscription: self.subscriptions.iter().find(|s| s.user_id == id).cloned(),
            user,
        }))
    }

    async fn get_feedback_for_user(&self, user_id: Uuid) -> sqlx::Result<Vec<Feedback>> {
        self.record()?;
        let mut rows: Vec<Feedback> = self.feedback.iter().filter(|f| f.user_id == user_id).cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn get_words_by_level(&self, user_id: Uuid, level: WordLevel) -> sqlx::Result<Vec<WordWithTags>> {
        self.record()?;
        let mut rows: Vec<WordWithTags> = self
            .words
            .iter()
            .filter(|w| w.word.user_id == user_id && w.word.level == level.value())
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.word.last_reviewed.cmp(&b.word.last_reviewed));
        Ok(rows)
    }

    async fn find_user_by_email(&self, email: &str) -> sqlx::Result<Option<User>> {
        self.record()?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn set_password_hash(&self, user_id: Uuid, password_hash: &str) -> sqlx::Result<bool> {
        self.record()?;
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == user_id) {
            Some(user) => {
                user.password = Some(password_hash.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// --- Fixtures ---

pub fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap()
}

pub fn user(id: Uuid, email: &str, password: Option<&str>) -> User {
    User {
        id,
        email: email.to_string(),
        name: Some("Learner".to_string()),
        password: password.map(str::to_string),
        role: "user".to_string(),
        preferred_language: "es".to_string(),
        daily_goal: 20,
        user_level: "intermediate".to_string(),
        default_category: Some("travel".to_string()),
        created_at: at(0),
    }
}

pub fn word(owner: Uuid, term: &str, level: i32, reviewed_hour: u32) -> WordWithTags {
    WordWithTags {
        word: Word {
            id: Uuid::new_v4(),
            user_id: owner,
            term: term.to_string(),
            translation: format!("{term}-en"),
            language: "es".to_string(),
            level,
            last_reviewed: at(reviewed_hour),
            created_at: at(0),
        },
        tags: vec![Tag {
            id: Uuid::new_v4(),
            name: "travel".to_string(),
        }],
    }
}

pub fn feedback(owner: Uuid, message: &str, hour: u32) -> Feedback {
    Feedback {
        id: Uuid::new_v4(),
        user_id: owner,
        message: message.to_string(),
        rating: Some(4),
        created_at: at(hour),
    }
}

/// Two users with words at several levels and feedback at distinct times.
pub fn seeded_repo() -> InMemoryRepo {
    InMemoryRepo {
        users: Mutex::new(vec![
            user(USER_A, "a@example.com", Some("$2b$04$hash-a")),
            user(USER_B, "b@example.com", None),
        ]),
        subscriptions: vec![Subscription {
            id: Uuid::new_v4(),
            user_id: USER_A,
            plan: "pro".to_string(),
            status: "active".to_string(),
            current_period_end: Some(at(23)),
            created_at: at(0),
        }],
        words: vec![
            word(USER_A, "hola", 2, 9),
            word(USER_A, "adios", 2, 3),
            word(USER_A, "gracias", 4, 1),
            word(USER_B, "perro", 2, 1),
            word(USER_B, "gato", 5, 2),
        ],
        feedback: vec![
            feedback(USER_A, "first", 1),
            feedback(USER_A, "third", 3),
            feedback(USER_B, "other user", 4),
            feedback(USER_A, "second", 2),
        ],
        ..InMemoryRepo::default()
    }
}

// --- App Helpers ---

pub fn production_config() -> AppConfig {
    AppConfig {
        env: Env::Production,
        session_secret: "test-secret-value-1234567890".to_string(),
        ..AppConfig::default()
    }
}

pub fn state_with(repo: Arc<InMemoryRepo>, config: AppConfig) -> AppState {
    AppState { repo, config }
}

pub fn app(repo: Arc<InMemoryRepo>, config: AppConfig) -> Router {
    create_router(state_with(repo, config))
}

pub fn token_for(config: &AppConfig, id: Uuid) -> String {
    issue_token(&config.session_secret, id, "user", Duration::hours(1)).unwrap()
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
