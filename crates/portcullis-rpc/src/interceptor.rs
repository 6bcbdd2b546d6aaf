//! Incoming-side extraction: surface the propagated identity to handlers.

use log::{debug, warn};
use tonic::service::Interceptor;
use tonic::{Request, Status};

use crate::{CallerIdentity, SUBJECT_METADATA_KEY};

/// Server interceptor that lifts the propagated subject out of call metadata
/// into a [`CallerIdentity`] request extension.
///
/// A call with no (or an empty) assertion proceeds *unauthenticated* rather
/// than being rejected: some internal paths legitimately run without a caller
/// identity. Every operation that does require one must go through
/// [`require_caller`] and fail closed.
///
/// No cryptographic verification happens here: the edge already did that
/// work once, and this layer trusts the network perimeter, not the token.
#[derive(Debug, Clone, Default)]
pub struct IdentityInterceptor;

impl Interceptor for IdentityInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        let subject = request
            .metadata()
            .get(SUBJECT_METADATA_KEY)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        match subject {
            Some(subject) if !subject.is_empty() => {
                debug!("caller identity {subject:?} extracted from metadata");
                request.extensions_mut().insert(CallerIdentity::new(subject));
            }
            _ => {
                warn!("no {SUBJECT_METADATA_KEY} metadata on incoming call; proceeding unauthenticated");
            }
        }

        Ok(request)
    }
}

/// The caller identity attached by [`IdentityInterceptor`], if any.
pub fn caller<T>(request: &Request<T>) -> Option<&CallerIdentity> {
    request.extensions().get::<CallerIdentity>()
}

/// Fail-closed accessor for operations that require an authenticated caller.
pub fn require_caller<T>(request: &Request<T>) -> Result<&CallerIdentity, Status> {
    caller(request).ok_or_else(|| Status::unauthenticated("caller identity not found in request"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::metadata::MetadataValue;

    fn intercept(request: Request<()>) -> Request<()> {
        IdentityInterceptor.call(request).unwrap()
    }

    #[test]
    fn extracts_identity_from_metadata() {
        let mut request = Request::new(());
        request
            .metadata_mut()
            .insert(SUBJECT_METADATA_KEY, MetadataValue::try_from("user-7").unwrap());

        let request = intercept(request);
        assert_eq!(caller(&request).unwrap().subject(), "user-7");
        assert_eq!(require_caller(&request).unwrap().subject(), "user-7");
    }

    #[test]
    fn missing_metadata_proceeds_unauthenticated() {
        let request = intercept(Request::new(()));
        assert!(caller(&request).is_none());
    }

    #[test]
    fn empty_metadata_value_counts_as_absent() {
        let mut request = Request::new(());
        request
            .metadata_mut()
            .insert(SUBJECT_METADATA_KEY, MetadataValue::try_from("").unwrap());

        let request = intercept(request);
        assert!(caller(&request).is_none());
    }

    #[test]
    fn require_caller_fails_closed_with_unauthenticated() {
        let request = intercept(Request::new(()));
        let status = require_caller(&request).unwrap_err();
        assert_eq!(status.code(), tonic::Code::Unauthenticated);
    }

    #[test]
    fn round_trip_with_propagation_helper() {
        let mut outgoing = Request::new(());
        crate::propagate::attach_subject(&mut outgoing, "user-9").unwrap();

        // Simulate the server side seeing the same metadata.
        let mut incoming = Request::new(());
        for kv in outgoing.metadata().iter() {
            if let tonic::metadata::KeyAndValueRef::Ascii(key, value) = kv {
                incoming.metadata_mut().insert(key.clone(), value.clone());
            }
        }

        let incoming = intercept(incoming);
        assert_eq!(require_caller(&incoming).unwrap().subject(), "user-9");
    }
}
