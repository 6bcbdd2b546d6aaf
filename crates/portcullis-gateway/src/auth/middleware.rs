//! Authentication middleware.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};

use portcullis_auth::{AuthError, TokenVerifier, VerifiedIdentity};

use super::rejection::AuthRejection;

/// Authentication state shared across all protected routes.
///
/// Holds the one configured verifier. A gate constructed without one (a
/// deployment that failed to load its public key) rejects every request with
/// the distinct `NotConfigured` reason instead of a misleading signature
/// failure.
#[derive(Clone)]
pub struct AuthState {
    verifier: Option<Arc<TokenVerifier>>,
}

impl AuthState {
    /// Gate backed by a verifier.
    pub fn new(verifier: TokenVerifier) -> Self {
        Self {
            verifier: Some(Arc::new(verifier)),
        }
    }

    /// Gate with no public key loaded.
    pub fn unconfigured() -> Self {
        Self { verifier: None }
    }

    /// Verify a raw bearer value.
    pub fn verify(&self, raw: &str) -> Result<VerifiedIdentity, AuthError> {
        match &self.verifier {
            Some(verifier) => verifier.verify(raw),
            None => Err(AuthError::NotConfigured),
        }
    }
}

/// The verified caller of the current request.
///
/// Inserted into request extensions by [`auth_middleware`]; extracted by any
/// handler that needs the caller. Request-scoped only.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    identity: VerifiedIdentity,
}

impl CurrentUser {
    /// The verified subject.
    pub fn subject(&self) -> &str {
        self.identity.subject()
    }

    /// The identity value to propagate into internal calls.
    pub fn identity(&self) -> &VerifiedIdentity {
        &self.identity
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AuthRejection(AuthError::MissingToken))
    }
}

/// Authentication middleware.
///
/// Wraps every protected inbound request: extracts the `Authorization`
/// header, verifies it, and injects [`CurrentUser`] into request extensions.
/// On any failure the request is terminated here; no downstream handler runs
/// without a verified identity present.
pub async fn auth_middleware(
    State(auth): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    let raw = match request.headers().get(AUTHORIZATION) {
        None => return Err(AuthRejection(AuthError::MissingToken)),
        Some(value) => value
            .to_str()
            .map_err(|_| AuthRejection(AuthError::MalformedToken))?,
    };

    let identity = auth.verify(raw).map_err(AuthRejection)?;

    request.extensions_mut().insert(CurrentUser { identity });
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use portcullis_auth::VerificationKey;

    const PUBLIC_PEM: &str = include_str!("../../testdata/rsa_test_key.pub.pem");

    #[test]
    fn unconfigured_gate_reports_not_configured() {
        let state = AuthState::unconfigured();
        assert_eq!(state.verify("whatever").unwrap_err(), AuthError::NotConfigured);
    }

    #[test]
    fn configured_gate_delegates_to_the_verifier() {
        let verifier =
            TokenVerifier::new(VerificationKey::from_pem(PUBLIC_PEM.as_bytes()).unwrap());
        let state = AuthState::new(verifier);
        // Garbage is a token problem, not a configuration problem.
        assert_eq!(state.verify("junk").unwrap_err(), AuthError::MalformedToken);
    }
}
