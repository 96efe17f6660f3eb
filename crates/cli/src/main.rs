//! Order Portal CLI - drive the portal client from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Log in and load the profile
//! portal-cli login -u buyer -p secret
//!
//! # Show or edit the profile
//! portal-cli profile show
//! portal-cli profile update --full-name "Иванов Иван Иванович" --phone "+7 (999) 123-45-67"
//!
//! # Reference data
//! portal-cli coefficients
//! portal-cli materials --process cnc-lathe
//!
//! # Upload a CAD model
//! portal-cli upload bracket.step
//! ```
//!
//! # Environment Variables
//!
//! - `PORTAL_API_URL`, `PORTAL_API_BASE_PATH` - backend location
//! - `PORTAL_STORAGE_PATH` - where the session is kept between runs
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT` - optional error tracking
//! - `RUST_LOG` - log filter

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use order_portal_client::{ClientConfig, FileStorage, PortalClient};
use secrecy::SecretString;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "portal-cli")]
#[command(author, version, about = "Manufacturing order portal CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with username and password
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, value_parser = parse_secret)]
        password: SecretString,
    },
    /// Create an account
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, value_parser = parse_secret)]
        password: SecretString,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show or edit the profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// List finish, cover and tolerance options
    Coefficients,
    /// List materials
    Materials {
        /// Process id (`cnc-lathe`, `printing`, ...); all catalogue
        /// processes when omitted
        #[arg(long)]
        process: Option<String>,
    },
    /// Upload a CAD model (STL/STEP) or a supporting document
    Upload {
        path: PathBuf,

        /// Upload as a document instead of a CAD model
        #[arg(long)]
        document: bool,
    },
    /// Show client and API versions
    Version {
        /// Check whether a backend API version is supported
        #[arg(long)]
        check: Option<String>,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Fetch and show the profile
    Show,
    /// Change profile fields
    Update {
        #[arg(long)]
        full_name: Option<String>,

        #[arg(long)]
        address: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        email: Option<String>,
    },
}

#[allow(clippy::unnecessary_wraps)]
fn parse_secret(value: &str) -> Result<SecretString, std::convert::Infallible> {
    Ok(SecretString::from(value))
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry() -> Option<sentry::ClientInitGuard> {
    let dsn = std::env::var("SENTRY_DSN").ok().filter(|d| !d.is_empty())?;

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: std::env::var("SENTRY_ENVIRONMENT")
                .ok()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let sentry_guard = init_sentry();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "order_portal_client=info,order_portal_cli=info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(
            sentry_guard
                .is_some()
                .then(|| sentry_tracing::layer().event_filter(sentry_event_filter)),
        )
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        drop(sentry_guard);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Commands::Version { check } = &cli.command {
        commands::version::show(check.as_deref());
        return Ok(());
    }

    let config = ClientConfig::from_env()?;
    let storage = Arc::new(FileStorage::open(&config.storage_path)?);
    let client = PortalClient::builder(config, storage).build()?;

    match cli.command {
        Commands::Login { username, password } => {
            commands::session::login(&client, username, password).await?;
        }
        Commands::Register {
            username,
            password,
            email,
            phone,
        } => {
            commands::session::register(
                &client,
                username,
                password,
                email.as_deref(),
                phone.as_deref(),
            )
            .await?;
        }
        Commands::Logout => commands::session::logout(&client),
        Commands::Profile { action } => match action {
            ProfileAction::Show => commands::profile::show(&client).await?,
            ProfileAction::Update {
                full_name,
                address,
                phone,
                email,
            } => {
                let changes = commands::profile::ProfileChanges {
                    full_name,
                    address,
                    phone,
                    email,
                };
                commands::profile::update(&client, changes).await?;
            }
        },
        Commands::Coefficients => commands::reference::coefficients(&client).await?,
        Commands::Materials { process } => {
            commands::reference::materials(&client, process.as_deref()).await?;
        }
        Commands::Upload { path, document } => {
            commands::upload::upload(&client, &path, document).await?;
        }
        // Answered before connecting.
        Commands::Version { .. } => {}
    }
    Ok(())
}
