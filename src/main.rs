//! CLI entry point: wires the preference store, session cache, and API
//! client together behind clap subcommands.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use campus_connect::api::{ApiClient, Notice};
use campus_connect::config::AppConfig;
use campus_connect::prefs::{keys, PrefsStore};
use campus_connect::session::{AuthSession, SessionError, UserProfile};

#[derive(Parser)]
#[command(name = "campus-connect", version, about = "College community client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Authenticate with a bearer token and cache your profile.
    Login {
        /// Bearer token issued by the campus server.
        #[arg(long)]
        token: String,
    },
    /// Clear the stored session and cached profile.
    Logout,
    /// Show the cached profile.
    Profile {
        /// Re-fetch from the server before showing.
        #[arg(long)]
        refresh: bool,
    },
    /// List current notices.
    Notices,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = AppConfig::load()?;
    let prefs = PrefsStore::open(&config.prefs_db_path())?;

    match cli.command {
        Command::Login { token } => login(&config, &prefs, &token).await,
        Command::Logout => logout(&prefs),
        Command::Profile { refresh } => profile(&config, &prefs, refresh).await,
        Command::Notices => notices(&config, &prefs).await,
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();
}

async fn login(config: &AppConfig, prefs: &PrefsStore, token: &str) -> Result<()> {
    let client = ApiClient::new(&config.server_url, Some(token))?;

    match client.fetch_current_user().await {
        Ok(user) => {
            // Session and profile are only persisted once the token is
            // proven against the server.
            AuthSession::new(token).persist(prefs)?;
            user.save(prefs)?;
            println!("Logged in as {}", user.display_name());
            Ok(())
        }
        Err(err) => {
            tracing::warn!("login fetch failed: {err}");
            bail!("{}", err.user_message());
        }
    }
}

fn logout(prefs: &PrefsStore) -> Result<()> {
    AuthSession::clear(prefs)?;
    UserProfile::clear(prefs)?;
    println!("Logged out.");
    Ok(())
}

async fn profile(config: &AppConfig, prefs: &PrefsStore, refresh: bool) -> Result<()> {
    if refresh {
        let session = require_session(prefs)?;
        let client = ApiClient::new(&config.server_url, Some(&session.token))?;

        match client.fetch_current_user().await {
            Ok(user) => {
                user.save(prefs)?;
                print_profile(&user);
                Ok(())
            }
            Err(err) => {
                tracing::warn!("profile fetch failed: {err}");
                bail!("{}", err.user_message());
            }
        }
    } else {
        match UserProfile::load(prefs) {
            Ok(user) => {
                print_profile(&user);
                Ok(())
            }
            Err(SessionError::DetailsNotPresent) => {
                // Keep the stored flag consistent so later reads fail fast too.
                prefs.put_bool(keys::IS_USER_DETAILS_PRESENT, false)?;
                bail!("No cached profile. Run `campus-connect login --token <token>` first.");
            }
        }
    }
}

async fn notices(config: &AppConfig, prefs: &PrefsStore) -> Result<()> {
    let session = require_session(prefs)?;
    let client = ApiClient::new(&config.server_url, Some(&session.token))?;

    match client.fetch_notices().await {
        Ok(list) if list.is_empty() => {
            println!("No notices.");
            Ok(())
        }
        Ok(list) => {
            for notice in &list {
                print_notice(notice);
            }
            Ok(())
        }
        Err(err) => {
            tracing::warn!("notices fetch failed: {err}");
            bail!("{}", err.user_message());
        }
    }
}

fn require_session(prefs: &PrefsStore) -> Result<AuthSession> {
    AuthSession::load(prefs)
        .context("Not logged in. Run `campus-connect login --token <token>` first.")
}

fn print_profile(user: &UserProfile) {
    println!("{} <{}>", user.display_name(), user.email_address);
    println!("  id:               {}", user.id);
    println!("  department:       {}", user.department_name);
    println!("  university roll:  {}", user.univ_roll);
    println!("  admission year:   {}", user.admission_year);
    println!("  passout year:     {}", user.passout_year);
    println!("  current semester: {}", user.current_semester);
    println!(
        "  alumnus: {}  admin: {}  verified: {}",
        user.is_alumnus, user.is_admin, user.is_verified
    );
    if !user.url.is_empty() {
        println!("  profile url:      {}", user.url);
    }
}

fn print_notice(notice: &Notice) {
    match notice.created_at {
        Some(ts) => println!("[{}] {}", ts.format("%Y-%m-%d %H:%M"), notice.title),
        None => println!("{}", notice.title),
    }
    if !notice.message.is_empty() {
        println!("    {}", notice.message);
    }
}
