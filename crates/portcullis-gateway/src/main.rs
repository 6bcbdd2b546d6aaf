use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};
use tokio::net::TcpListener;

use portcullis_auth::{TokenVerifier, VerificationKey};
use portcullis_gateway::auth::AuthState;
use portcullis_gateway::config::Settings;
use portcullis_gateway::routes::create_router;
use portcullis_gateway::upstream::Upstream;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Portcullis edge gateway: verifies bearer tokens and propagates identity to internal services."
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
    let verification = VerificationKey::from_pem_file(&settings.public_key_path)
        .context("loading RSA public key")?;
    let auth = AuthState::new(TokenVerifier::new(verification));

    // Validate the upstream endpoint at startup so a bad URL fails here,
    // not on the first forwarded call.
    if let Some(endpoint) = &settings.upstream_endpoint {
        let upstream = Upstream::new(
            endpoint,
            Duration::from_millis(settings.upstream_timeout_ms),
        )
        .context("configuring upstream endpoint")?;
        info!("forwarding internal calls to {upstream:?}");
    }

    let app = create_router(auth);

    let listener = TcpListener::bind(&settings.listen_addr)
        .await
        .with_context(|| format!("binding {}", settings.listen_addr))?;
    info!("gateway listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("listening for shutdown signal: {err}");
    }
}
