//! habits-admin - account provisioning.
//!
//! Usage:
//!   habits-admin create-user        Create a regular active user
//!   habits-admin create-superuser   Create an active staff superuser

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use uuid::Uuid;

use habits_api::auth::hash_password;
use habits_db::Database;

/// habits-admin - manage habit tracker accounts
#[derive(Parser)]
#[command(name = "habits-admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "HABITS_DB_PATH", default_value = "habits.db")]
    db: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a regular active user
    CreateUser {
        #[arg(long, default_value = "aa@a.ru")]
        email: String,

        #[arg(long, default_value = "123")]
        password: String,

        /// Telegram chat id for reminders
        #[arg(long)]
        tg_chat_id: Option<String>,
    },

    /// Create an active staff superuser
    CreateSuperuser {
        #[arg(long, default_value = "a@a.ru")]
        email: String,

        #[arg(long, default_value = "123")]
        password: String,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "habits_admin=info,habits_db=warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let db = Database::open(&cli.db)?;

    match cli.command {
        Commands::CreateUser { email, password, tg_chat_id } => {
            let id = create_account(&db, &email, &password, tg_chat_id.as_deref(), false)?;
            info!("Created user {} ({})", email, id);
        }
        Commands::CreateSuperuser { email, password } => {
            let id = create_account(&db, &email, &password, None, true)?;
            info!("Created superuser {} ({})", email, id);
        }
    }

    Ok(())
}

fn create_account(
    db: &Database,
    email: &str,
    password: &str,
    tg_chat_id: Option<&str>,
    superuser: bool,
) -> Result<Uuid> {
    let email = email.trim().to_lowercase();
    if db.get_user_by_email(&email)?.is_some() {
        bail!("user {} already exists", email);
    }

    let id = Uuid::new_v4();
    let hash = hash_password(password)?;
    db.create_user(&id.to_string(), &email, &hash, tg_chat_id, superuser, superuser)?;
    Ok(id)
}
