//! Operational commands behind the `lingo-admin` binary.
//!
//! Each command takes the repository and explicit input/output handles so it can be driven
//! from a terminal or from tests. Passwords are always read from input, never from arguments.

use chrono::{Duration, Utc};
use std::io::{BufRead, Write};
use thiserror::Error;

use crate::{
    auth,
    models::{SessionUser, User, UserWithSubscription},
    repository::Repository,
};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("no user with email {0}")]
    UserNotFound(String),
    #[error("aborted: confirmation did not match")]
    Aborted,
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,
    #[error("input closed before a value was read")]
    InputClosed,
    #[error("token lifetime must be a positive number of minutes that fits a timestamp, got {0}")]
    InvalidTtl(i64),
    #[error("database error: {0}")]
    Storage(#[from] sqlx::Error),
    #[error("hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AdminResult<T> = Result<T, AdminError>;

/// Prints `label`, then reads one line with the trailing newline removed.
fn prompt(input: &mut impl BufRead, output: &mut impl Write, label: &str) -> AdminResult<String> {
    write!(output, "{label}")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(AdminError::InputClosed);
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn require_user(repo: &dyn Repository, email: &str) -> AdminResult<User> {
    repo.find_user_by_email(email)
        .await?
        .ok_or_else(|| AdminError::UserNotFound(email.to_string()))
}

/// reset_password
///
/// Reads the new password twice, asks the operator to type the email back (unless
/// `assume_yes`), then stores a bcrypt hash at `cost`.
pub async fn reset_password(
    repo: &dyn Repository,
    email: &str,
    assume_yes: bool,
    cost: u32,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> AdminResult<()> {
    let user = require_user(repo, email).await?;

    let password = prompt(input, output, "New password: ")?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AdminError::PasswordTooShort);
    }
    let repeated = prompt(input, output, "Repeat password: ")?;
    if repeated != password {
        return Err(AdminError::PasswordMismatch);
    }

    if !assume_yes {
        let typed = prompt(
            input,
            output,
            &format!("Type the email address ({}) to confirm: ", user.email),
        )?;
        if !typed.trim().eq_ignore_ascii_case(&user.email) {
            return Err(AdminError::Aborted);
        }
    }

    let hash = bcrypt::hash(&password, cost)?;
    if !repo.set_password_hash(user.id, &hash).await? {
        return Err(AdminError::UserNotFound(email.to_string()));
    }

    tracing::info!(user_id = %user.id, "password reset");
    writeln!(output, "Password updated for {}", user.email)?;
    Ok(())
}

/// check_user
///
/// Prints the account as the API would project it, plus whether a password is set.
pub async fn check_user(repo: &dyn Repository, email: &str, output: &mut impl Write) -> AdminResult<()> {
    let user = require_user(repo, email).await?;
    let has_password = user.password.is_some();

    let record = repo
        .get_user_with_subscription(user.id)
        .await?
        .unwrap_or(UserWithSubscription {
            user,
            subscription: None,
        });

    let profile = SessionUser::from(record);
    writeln!(output, "{}", serde_json::to_string_pretty(&profile)?)?;
    writeln!(output, "password set: {}", if has_password { "yes" } else { "no" })?;
    Ok(())
}

/// test_auth
///
/// Reads a password and checks it against the stored hash. Returns whether it matched.
pub async fn test_auth(
    repo: &dyn Repository,
    email: &str,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> AdminResult<bool> {
    let user = require_user(repo, email).await?;

    let Some(hash) = user.password.as_deref() else {
        writeln!(output, "{} has no password set", user.email)?;
        return Ok(false);
    };

    let candidate = prompt(input, output, "Password: ")?;
    let matched = bcrypt::verify(&candidate, hash)?;
    writeln!(output, "{}", if matched { "credentials valid" } else { "credentials invalid" })?;
    Ok(matched)
}

/// issue_token
///
/// Signs a session token for the user, for manual API testing.
pub async fn issue_token(
    repo: &dyn Repository,
    session_secret: &str,
    email: &str,
    ttl_minutes: i64,
    output: &mut impl Write,
) -> AdminResult<String> {
    let ttl = Duration::try_minutes(ttl_minutes)
        .filter(|ttl| *ttl > Duration::zero())
        .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
        .ok_or(AdminError::InvalidTtl(ttl_minutes))?;

    let user = require_user(repo, email).await?;
    let token = auth::issue_token(session_secret, user.id, &user.role, ttl)?;
    writeln!(output, "{token}")?;
    Ok(token)
}
