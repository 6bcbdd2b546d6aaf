//! Upstream internal-service plumbing.
//!
//! Owns the lazily-connected channel to an internal service and builds the
//! per-request tonic requests that carry the verified identity across the
//! trust boundary. The original bearer token never crosses it.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::RwLock;
use tonic::Request;
use tonic::transport::{Channel, Endpoint};

use portcullis_auth::VerifiedIdentity;
use portcullis_rpc::propagate::{PropagateError, attach_subject};

/// Upstream connection failures.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("invalid upstream endpoint {endpoint:?}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("connecting to upstream: {0}")]
    Connect(#[from] tonic::transport::Error),

    #[error(transparent)]
    Propagate(#[from] PropagateError),
}

/// A single internal service the gateway forwards calls to.
#[derive(Clone)]
pub struct Upstream {
    endpoint: Endpoint,
    request_timeout: Duration,
    channel: Arc<RwLock<Option<Channel>>>,
}

impl Upstream {
    /// Configure an upstream (no connection is made yet).
    pub fn new(endpoint: &str, request_timeout: Duration) -> Result<Self, UpstreamError> {
        let endpoint = Endpoint::from_shared(endpoint.to_string()).map_err(|source| {
            UpstreamError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                source,
            }
        })?;

        Ok(Self {
            endpoint,
            request_timeout,
            channel: Arc::new(RwLock::new(None)),
        })
    }

    /// The channel to this upstream, connecting on first use and reusing the
    /// connection afterwards.
    pub async fn channel(&self) -> Result<Channel, UpstreamError> {
        {
            let guard = self.channel.read().await;
            if let Some(channel) = guard.as_ref() {
                return Ok(channel.clone());
            }
        }

        let channel = self.endpoint.connect().await?;
        *self.channel.write().await = Some(channel.clone());
        Ok(channel)
    }

    /// Build an internal request on behalf of a verified caller: the subject
    /// rides along as the propagated assertion, and the gateway's per-call
    /// deadline is set so an abandoned edge request is not retried upstream.
    pub fn authorized_request<T>(
        &self,
        message: T,
        identity: &VerifiedIdentity,
    ) -> Result<Request<T>, UpstreamError> {
        let mut request = Request::new(message);
        attach_subject(&mut request, identity.subject())?;
        request.set_timeout(self.request_timeout);
        Ok(request)
    }
}

impl std::fmt::Debug for Upstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upstream")
            .field("endpoint", &self.endpoint.uri())
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use portcullis_auth::{SigningKey, TokenIssuer, TokenVerifier, VerificationKey};
    use portcullis_rpc::SUBJECT_METADATA_KEY;

    const PRIVATE_PEM: &str = include_str!("../testdata/rsa_test_key.pem");
    const PUBLIC_PEM: &str = include_str!("../testdata/rsa_test_key.pub.pem");

    fn verified_identity(subject: &str) -> VerifiedIdentity {
        // Identities only exist on the far side of a real verification.
        let issuer = TokenIssuer::new(
            SigningKey::from_pem(PRIVATE_PEM.as_bytes()).unwrap(),
            TimeDelta::minutes(3),
        );
        let verifier =
            TokenVerifier::new(VerificationKey::from_pem(PUBLIC_PEM.as_bytes()).unwrap());
        let issued = issuer.issue(subject, None).unwrap();
        verifier.verify(&issued.token).unwrap()
    }

    #[test]
    fn rejects_invalid_endpoint() {
        let err = Upstream::new("not a uri", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, UpstreamError::InvalidEndpoint { .. }));
    }

    #[test]
    fn accepts_http_endpoint() {
        Upstream::new("http://127.0.0.1:50051", Duration::from_secs(1)).unwrap();
    }

    #[test]
    fn authorized_request_carries_the_assertion_not_the_token() {
        let upstream = Upstream::new("http://127.0.0.1:50051", Duration::from_secs(2)).unwrap();
        let identity = verified_identity("user-42");

        let request = upstream.authorized_request((), &identity).unwrap();

        let subject = request
            .metadata()
            .get(SUBJECT_METADATA_KEY)
            .and_then(|v| v.to_str().ok());
        assert_eq!(subject, Some("user-42"));

        // The deadline rides along too, and nothing that looks like a signed
        // token leaks into the metadata.
        let mut keys = Vec::new();
        for kv in request.metadata().iter() {
            if let tonic::metadata::KeyAndValueRef::Ascii(key, value) = kv {
                keys.push(key.as_str().to_string());
                assert!(!value.to_str().unwrap().contains('.'));
            }
        }
        assert!(keys.contains(&SUBJECT_METADATA_KEY.to_string()));
        assert!(keys.contains(&"grpc-timeout".to_string()));
    }
}
