//! Administrative CLI for the language-learning portal.
//!
//! Usage:
//! ```bash
//! # Reset a password (prompts for the new value and a confirmation)
//! lingo-admin reset-password --email learner@example.com
//!
//! # Show what the API returns for a user
//! lingo-admin check-user --email learner@example.com
//!
//! # Verify a password against the stored hash
//! lingo-admin test-auth --email learner@example.com
//!
//! # Print a session token valid for 30 minutes
//! lingo-admin issue-token --email learner@example.com --ttl-minutes 30
//! ```

use clap::{Parser, Subcommand};
use lingo_portal::{AppConfig, PostgresRepository, admin};
use sqlx::postgres::PgPoolOptions;
use std::io;

#[derive(Parser)]
#[command(
    name = "lingo-admin",
    about = "Language portal administration CLI",
    long_about = "Operational tasks against the portal database. Reads DATABASE_URL and SESSION_SECRET like the server."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Set a new password for a user
    ResetPassword {
        #[arg(long)]
        email: String,

        /// Skip the type-the-email confirmation
        #[arg(long)]
        yes: bool,
    },

    /// Print a user's profile and whether a password is set
    CheckUser {
        #[arg(long)]
        email: String,
    },

    /// Check a password against the stored hash
    TestAuth {
        #[arg(long)]
        email: String,
    },

    /// Print a signed session token for a user
    IssueToken {
        #[arg(long)]
        email: String,

        /// Token lifetime in minutes
        #[arg(long, default_value = "60", value_parser = clap::value_parser!(i64).range(1..))]
        ttl_minutes: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(io::stderr)
        .init();

    dotenv::dotenv().ok();
    let config = AppConfig::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&config.db_url)
        .await?;
    let repo = PostgresRepository::new(pool);

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    match cli.command {
        Command::ResetPassword { email, yes } => {
            admin::reset_password(&repo, &email, yes, bcrypt::DEFAULT_COST, &mut input, &mut output).await?;
        }
        Command::CheckUser { email } => {
            admin::check_user(&repo, &email, &mut output).await?;
        }
        Command::TestAuth { email } => {
            if !admin::test_auth(&repo, &email, &mut input, &mut output).await? {
                std::process::exit(1);
            }
        }
        Command::IssueToken { email, ttl_minutes } => {
            admin::issue_token(&repo, &config.session_secret, &email, ttl_minutes, &mut output).await?;
        }
    }

    Ok(())
}
