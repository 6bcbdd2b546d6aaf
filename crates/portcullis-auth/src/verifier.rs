//! Token verification.
//!
//! The pipeline runs strictly in this order, failing terminally at the first
//! rejection: prefix strip → emptiness check → declared-algorithm check →
//! signature check → claims check. The algorithm check happens before any
//! cryptography and never selects a key from the token header: the verifier
//! holds exactly one configured public key and only accepts tokens whose
//! header declares the matching algorithm.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, Validation, decode};
use serde::Deserialize;

use crate::claims::Claims;
use crate::error::AuthError;
use crate::identity::VerifiedIdentity;
use crate::keys::VerificationKey;

/// The one algorithm this deployment signs and verifies with.
const EXPECTED_ALG: &str = "RS256";

/// Strip an optional `Bearer ` prefix and surrounding whitespace.
///
/// Idempotent: stripping an already-bare token returns it unchanged.
pub fn strip_bearer(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed.strip_prefix("Bearer ").unwrap_or(trimmed).trim()
}

/// The part of the protected header we inspect before verification.
#[derive(Debug, Deserialize)]
struct PeekedHeader {
    alg: String,
}

/// Validates bearer tokens against the configured public key.
///
/// Verification is pure CPU work over immutable key material; one verifier is
/// shared across all concurrent requests without locking.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    key: VerificationKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(key: VerificationKey) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        // No clock-skew allowance: a token expired by one second is expired.
        validation.leeway = 0;

        Self { key, validation }
    }

    /// Verify a raw bearer value (with or without the `Bearer ` prefix) and
    /// produce the caller's verified identity.
    pub fn verify(&self, raw: &str) -> Result<VerifiedIdentity, AuthError> {
        let token = strip_bearer(raw);
        if token.is_empty() {
            return Err(AuthError::MalformedToken);
        }

        let alg = peek_algorithm(token)?;
        if alg != EXPECTED_ALG {
            return Err(AuthError::UnsupportedAlgorithm { alg });
        }

        let data = decode::<Claims>(token, self.key.decoding(), &self.validation)
            .map_err(|err| classify_decode_error(err.kind(), &alg))?;

        if data.claims.subject_is_blank() {
            return Err(AuthError::MissingSubject);
        }

        Ok(VerifiedIdentity::new(data.claims.sub))
    }
}

/// Read the declared algorithm out of the compact header segment without
/// touching the signature.
fn peek_algorithm(token: &str) -> Result<String, AuthError> {
    let header_segment = token.split('.').next().ok_or(AuthError::MalformedToken)?;
    let header_bytes = URL_SAFE_NO_PAD
        .decode(header_segment)
        .map_err(|_| AuthError::MalformedToken)?;
    let header: PeekedHeader =
        serde_json::from_slice(&header_bytes).map_err(|_| AuthError::MalformedToken)?;
    Ok(header.alg)
}

fn classify_decode_error(kind: &ErrorKind, declared_alg: &str) -> AuthError {
    match kind {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::ImmatureSignature => AuthError::NotYetValid,
        ErrorKind::InvalidSignature => AuthError::SignatureInvalid,
        // Unreachable after the header peek, but keep the precise mapping.
        ErrorKind::InvalidAlgorithm => AuthError::UnsupportedAlgorithm {
            alg: declared_alg.to_string(),
        },
        _ => AuthError::MalformedToken,
    }
}
