//! Gateway configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Default per-call deadline for internal requests, in milliseconds.
const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 2_000;

/// Gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Address the HTTP server binds to.
    pub listen_addr: String,
    /// PEM-encoded RSA public key for token verification. Required.
    pub public_key_path: PathBuf,
    /// Internal service endpoint calls are forwarded to (e.g.
    /// `http://127.0.0.1:50051`).
    pub upstream_endpoint: Option<String>,
    /// Deadline applied to each internal call.
    pub upstream_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            public_key_path: PathBuf::new(),
            upstream_endpoint: None,
            upstream_timeout_ms: DEFAULT_UPSTREAM_TIMEOUT_MS,
        }
    }
}

impl Settings {
    /// Load settings from an optional TOML file plus `GATEWAY_*` environment
    /// overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name("gateway").required(false)),
        };

        builder = builder.add_source(Environment::with_prefix("GATEWAY").separator("__"));

        let settings: Settings = builder
            .build()
            .context("reading configuration")?
            .try_deserialize()
            .context("deserializing configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    /// A gateway that cannot verify tokens must not start.
    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.public_key_path.as_os_str() != "",
            "public_key_path is not configured"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_public_key_fails_validation() {
        assert!(Settings::default().validate().is_err());

        let settings = Settings {
            public_key_path: PathBuf::from("/keys/public.pem"),
            ..Settings::default()
        };
        assert!(settings.validate().is_ok());
    }
}
