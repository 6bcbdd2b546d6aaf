use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::TimeDelta;
use clap::Parser;
use log::{LevelFilter, info};
use tokio::net::TcpListener;

use portcullis_auth::{SigningKey, TokenIssuer, TokenVerifier, VerificationKey};
use portcullis_identity::api::{AppState, create_router};
use portcullis_identity::config::Settings;
use portcullis_identity::db::Database;
use portcullis_identity::directory::Directory;
use portcullis_identity::session::{SessionRepository, SessionService};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Portcullis identity service: token issuance and revocable sessions."
)]
struct Cli {
    /// Override the config file path
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Reduce output to only errors
    #[arg(short, long, action = clap::ArgAction::SetTrue)]
    quiet: bool,
    /// Increase logging verbosity (stackable)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let settings = Settings::load(cli.config.as_deref())?;
    serve(settings).await
}

fn init_logging(quiet: bool, verbose: u8) {
    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

async fn serve(settings: Settings) -> Result<()> {
    let signing = SigningKey::from_pem_file(&settings.private_key_path)
        .context("loading RSA private key")?;
    let verification = VerificationKey::from_pem_file(&settings.public_key_path)
        .context("loading RSA public key")?;

    let ttl = TimeDelta::seconds(settings.token_ttl_secs as i64);
    let issuer = TokenIssuer::new(signing, ttl);
    let verifier = TokenVerifier::new(verification);

    // Prove the key pair can actually sign and verify before accepting
    // traffic: a service that cannot authenticate anyone must not start.
    let probe = issuer
        .issue("startup-probe", None)
        .context("signing startup probe token")?;
    verifier
        .verify(&probe.token)
        .map_err(anyhow::Error::from)
        .context("verifying startup probe token; do the key halves match?")?;

    let db = Database::new(&settings.database_path).await?;
    let repo = SessionRepository::new(db.pool().clone());
    let sessions = SessionService::new(issuer, verifier, repo);

    let state = AppState::new(sessions, Directory::new(settings.users.clone()));
    let app = create_router(state);

    let listener = TcpListener::bind(&settings.listen_addr)
        .await
        .with_context(|| format!("binding {}", settings.listen_addr))?;
    info!("identity service listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("serving")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("listening for shutdown signal: {err}");
    }
}
