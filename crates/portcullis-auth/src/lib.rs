//! Credential core.
//!
//! Everything needed to mint and check bearer tokens lives here:
//! - PEM-loaded RSA key material ([`SigningKey`], [`VerificationKey`])
//! - typed claims ([`Claims`]) produced only by the validated decode path
//! - token issuance ([`TokenIssuer`]) and verification ([`TokenVerifier`])
//! - identity validation helpers ([`Identifier`], [`VerifiedIdentity`])
//!
//! The crate is framework-free on purpose: the HTTP edge and the internal RPC
//! layer both consume [`AuthError`] and map it to their own wire formats.

mod claims;
mod error;
mod identity;
mod issuer;
mod keys;
mod verifier;

pub use claims::Claims;
pub use error::AuthError;
pub use identity::{Identifier, IdentifierError, VerifiedIdentity, validate_login, validate_subject};
pub use issuer::{DEFAULT_TOKEN_TTL, IssueError, IssuedToken, TokenIssuer};
pub use keys::{KeyError, SigningKey, VerificationKey};
pub use verifier::{TokenVerifier, strip_bearer};
