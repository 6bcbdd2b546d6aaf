//! Token issuance.

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, Header, encode};
use thiserror::Error;

use crate::claims::Claims;
use crate::identity::validate_subject;
use crate::keys::SigningKey;

/// Default token lifetime. Deliberately short: session-bound re-validation is
/// preferred over long-lived stateless trust.
pub const DEFAULT_TOKEN_TTL: TimeDelta = TimeDelta::minutes(3);

/// Issuance failure.
///
/// A signing failure means the service cannot authenticate anyone; callers
/// treat it as a fatal configuration error (verified by a startup probe), not
/// a per-request condition.
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("subject must be non-empty")]
    EmptySubject,

    #[error("signing token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// A freshly signed token together with the timestamps that were signed into
/// it, so the session record can copy them exactly instead of re-reading the
/// clock.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Builds and signs bearer tokens with the private key half.
///
/// Pure function of key, identity and clock; holds no mutable state and is
/// safely shared across concurrent logins.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    key: SigningKey,
    ttl: TimeDelta,
}

impl TokenIssuer {
    pub fn new(key: SigningKey, ttl: TimeDelta) -> Self {
        Self { key, ttl }
    }

    /// The configured token lifetime.
    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    /// Sign a token for `subject` with `iat = now` and `exp = now + ttl`.
    pub fn issue(
        &self,
        subject: &str,
        display_name: Option<&str>,
    ) -> Result<IssuedToken, IssueError> {
        if validate_subject(subject).is_err() {
            return Err(IssueError::EmptySubject);
        }

        let issued_at = Utc::now();
        let expires_at = issued_at + self.ttl;

        let claims = Claims {
            sub: subject.to_string(),
            name: display_name.map(str::to_string),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            nbf: None,
        };

        let token = encode(&Header::new(Algorithm::RS256), &claims, self.key.encoding())?;

        Ok(IssuedToken {
            token,
            issued_at,
            expires_at,
        })
    }
}
