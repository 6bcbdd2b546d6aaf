//! Verification error taxonomy.

use thiserror::Error;

/// Why a bearer token was rejected.
///
/// One variant per rejection reason, matched exhaustively by callers. Every
/// variant is terminal for the request that carried the token: an invalid or
/// expired credential cannot become valid by retrying.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No credential was presented at all.
    #[error("missing authorization token")]
    MissingToken,

    /// The bearer value is empty after prefix stripping, or is not a
    /// structurally valid compact token.
    #[error("malformed token")]
    MalformedToken,

    /// The token header declares an algorithm other than the one asymmetric
    /// scheme this deployment verifies (including the `none` pseudo-algorithm).
    #[error("unsupported signing algorithm: {alg}")]
    UnsupportedAlgorithm { alg: String },

    /// The signature does not verify against the configured public key.
    #[error("invalid token signature")]
    SignatureInvalid,

    /// The `exp` claim is in the past.
    #[error("token has expired")]
    Expired,

    /// The `nbf` claim is in the future.
    #[error("token not yet valid")]
    NotYetValid,

    /// The `sub` claim is absent or blank.
    #[error("missing or empty subject claim")]
    MissingSubject,

    /// The verifier has no public key loaded. This is an operational failure
    /// of the deployment, not a property of the presented token.
    #[error("verifier is not configured with a public key")]
    NotConfigured,
}

impl AuthError {
    /// True for the one variant that indicates a broken deployment rather
    /// than a bad credential.
    pub fn is_operational(&self) -> bool {
        matches!(self, AuthError::NotConfigured)
    }
}
