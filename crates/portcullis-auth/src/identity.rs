//! Verified identities and identity-format validation.

use thiserror::Error;
use uuid::Uuid;

/// The output of a successful token verification.
///
/// Carries no cryptographic material forward, and is only ever constructed by
/// the validated decode path. Request-scoped: created once per inbound edge
/// request and dropped with it, never persisted or reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    subject: String,
}

impl VerifiedIdentity {
    /// Wrap an already-validated, non-blank subject.
    pub(crate) fn new(subject: String) -> Self {
        Self { subject }
    }

    /// The authenticated subject (user ID).
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Consume into the bare subject string.
    pub fn into_subject(self) -> String {
        self.subject
    }
}

/// Rejection reasons for identity-format validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("subject must be non-empty")]
    BlankSubject,

    #[error("invalid user ID format: {0}")]
    InvalidUserId(String),

    #[error("invalid login: {0}")]
    InvalidLogin(String),
}

/// Check that a subject is usable as an identity: present and non-blank.
pub fn validate_subject(subject: &str) -> Result<(), IdentifierError> {
    if subject.trim().is_empty() {
        return Err(IdentifierError::BlankSubject);
    }
    Ok(())
}

/// Check a human-chosen login name: 3..=32 chars, starts with a letter, the
/// rest letters, digits or underscores.
pub fn validate_login(login: &str) -> Result<(), IdentifierError> {
    let mut chars = login.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            login.len() >= 3
                && login.len() <= 32
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(IdentifierError::InvalidLogin(login.to_string()))
    }
}

/// A user handle as presented by a caller: either a canonical user ID (UUID)
/// or a login name. Hyphens mark the UUID form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    UserId(Uuid),
    Login(String),
}

impl Identifier {
    /// Classify and validate a raw identifier string.
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        if raw.contains('-') {
            let id = Uuid::parse_str(raw)
                .map_err(|_| IdentifierError::InvalidUserId(raw.to_string()))?;
            Ok(Identifier::UserId(id))
        } else {
            validate_login(raw)?;
            Ok(Identifier::Login(raw.to_string()))
        }
    }
}
