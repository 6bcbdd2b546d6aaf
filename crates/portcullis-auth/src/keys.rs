//! RSA key material.
//!
//! Keys are loaded from PEM once at process startup and shared read-only
//! across all concurrent issuances and verifications. A missing or unreadable
//! key file is a fatal startup condition, never a per-request error.

use std::path::Path;

use jsonwebtoken::{DecodingKey, EncodingKey};
use thiserror::Error;

/// Failure to load key material.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("reading key file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing RSA key from PEM: {0}")]
    InvalidPem(#[from] jsonwebtoken::errors::Error),
}

/// The private half of the key pair. Held only by the issuing service.
#[derive(Clone)]
pub struct SigningKey {
    encoding: EncodingKey,
}

impl SigningKey {
    /// Parse a PKCS#1 or PKCS#8 PEM-encoded RSA private key.
    pub fn from_pem(pem: &[u8]) -> Result<Self, KeyError> {
        let encoding = EncodingKey::from_rsa_pem(pem)?;
        Ok(Self { encoding })
    }

    /// Load the private key from a PEM file.
    pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self, KeyError> {
        let path = path.as_ref();
        let pem = std::fs::read(path).map_err(|source| KeyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_pem(&pem)
    }

    pub(crate) fn encoding(&self) -> &EncodingKey {
        &self.encoding
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose key bytes in logs.
        f.debug_struct("SigningKey").finish_non_exhaustive()
    }
}

/// The public half of the key pair. Distributed to every verifier process.
#[derive(Clone)]
pub struct VerificationKey {
    decoding: DecodingKey,
}

impl VerificationKey {
    /// Parse a PEM-encoded RSA public key.
    pub fn from_pem(pem: &[u8]) -> Result<Self, KeyError> {
        let decoding = DecodingKey::from_rsa_pem(pem)?;
        Ok(Self { decoding })
    }

    /// Load the public key from a PEM file.
    pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self, KeyError> {
        let path = path.as_ref();
        let pem = std::fs::read(path).map_err(|source| KeyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_pem(&pem)
    }

    pub(crate) fn decoding(&self) -> &DecodingKey {
        &self.decoding
    }
}

impl std::fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationKey").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIVATE_PEM: &str = include_str!("../testdata/rsa_test_key.pem");
    const PUBLIC_PEM: &str = include_str!("../testdata/rsa_test_key.pub.pem");

    #[test]
    fn parses_valid_pem_pair() {
        SigningKey::from_pem(PRIVATE_PEM.as_bytes()).unwrap();
        VerificationKey::from_pem(PUBLIC_PEM.as_bytes()).unwrap();
    }

    #[test]
    fn rejects_garbage_pem() {
        let err = SigningKey::from_pem(b"not a pem").unwrap_err();
        assert!(matches!(err, KeyError::InvalidPem(_)));

        let err = VerificationKey::from_pem(b"-----BEGIN NOTHING-----").unwrap_err();
        assert!(matches!(err, KeyError::InvalidPem(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = SigningKey::from_pem_file("/nonexistent/key.pem").unwrap_err();
        match err {
            KeyError::Io { path, .. } => assert_eq!(path, "/nonexistent/key.pem"),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn debug_never_prints_key_material() {
        let key = SigningKey::from_pem(PRIVATE_PEM.as_bytes()).unwrap();
        let rendered = format!("{key:?}");
        assert!(!rendered.contains("PRIVATE"));
        assert!(rendered.starts_with("SigningKey"));
    }
}
