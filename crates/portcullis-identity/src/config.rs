//! Service configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::directory::DirectoryUser;

/// Default token lifetime in seconds. Short by design: session-bound
/// re-validation instead of long-lived stateless trust.
const DEFAULT_TOKEN_TTL_SECS: u64 = 180;

/// Identity service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Address the HTTP server binds to.
    pub listen_addr: String,
    /// SQLite database file for the session store.
    pub database_path: PathBuf,
    /// PEM-encoded RSA private key used to sign tokens. Required.
    pub private_key_path: PathBuf,
    /// PEM-encoded RSA public key matching the private half. Required.
    pub public_key_path: PathBuf,
    /// Token (and session) lifetime in seconds.
    pub token_ttl_secs: u64,
    /// Registered users.
    pub users: Vec<DirectoryUser>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8081".to_string(),
            database_path: PathBuf::from("data/identity.db"),
            private_key_path: PathBuf::new(),
            public_key_path: PathBuf::new(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            users: Vec::new(),
        }
    }
}

impl Settings {
    /// Load settings from an optional TOML file plus `IDENTITY_*` environment
    /// overrides (e.g. `IDENTITY_LISTEN_ADDR`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name("identity").required(false)),
        };

        builder = builder.add_source(Environment::with_prefix("IDENTITY").separator("__"));

        let settings: Settings = builder
            .build()
            .context("reading configuration")?
            .try_deserialize()
            .context("deserializing configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    /// Key paths are required: a service that cannot sign or verify must not
    /// start.
    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.private_key_path.as_os_str() != "",
            "private_key_path is not configured"
        );
        anyhow::ensure!(
            self.public_key_path.as_os_str() != "",
            "public_key_path is not configured"
        );
        anyhow::ensure!(self.token_ttl_secs > 0, "token_ttl_secs must be positive");
        Ok(())
    }
}
