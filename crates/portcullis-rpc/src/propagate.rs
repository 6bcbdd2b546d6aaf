//! Outgoing-side propagation: attach the verified subject to internal calls.

use thiserror::Error;
use tonic::Request;
use tonic::metadata::MetadataValue;

use crate::SUBJECT_METADATA_KEY;

/// Failure to encode a subject as call metadata.
#[derive(Debug, Error)]
pub enum PropagateError {
    /// The subject contains bytes that are not valid ASCII metadata. Refused
    /// outright rather than truncated or lossily re-encoded.
    #[error("subject is not representable as call metadata: {subject:?}")]
    InvalidSubject { subject: String },
}

/// Attach `subject` to an outgoing request under [`SUBJECT_METADATA_KEY`].
///
/// This is a one-way, non-cryptographic assertion: the original token is
/// deliberately not forwarded, so downstream services need neither the public
/// key nor any verification logic.
pub fn attach_subject<T>(request: &mut Request<T>, subject: &str) -> Result<(), PropagateError> {
    let value =
        MetadataValue::try_from(subject).map_err(|_| PropagateError::InvalidSubject {
            subject: subject.to_string(),
        })?;
    request.metadata_mut().insert(SUBJECT_METADATA_KEY, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attaches_subject_under_the_fixed_key() {
        let mut request = Request::new(());
        attach_subject(&mut request, "user-42").unwrap();

        let value = request
            .metadata()
            .get(SUBJECT_METADATA_KEY)
            .and_then(|v| v.to_str().ok());
        assert_eq!(value, Some("user-42"));
    }

    #[test]
    fn overwrites_any_preexisting_assertion() {
        let mut request = Request::new(());
        attach_subject(&mut request, "first").unwrap();
        attach_subject(&mut request, "second").unwrap();

        let values: Vec<_> = request
            .metadata()
            .get_all(SUBJECT_METADATA_KEY)
            .iter()
            .collect();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].to_str().unwrap(), "second");
    }

    #[test]
    fn non_ascii_subject_is_refused() {
        let mut request = Request::new(());
        let err = attach_subject(&mut request, "usér-42").unwrap_err();
        assert!(matches!(err, PropagateError::InvalidSubject { .. }));
        assert!(request.metadata().get(SUBJECT_METADATA_KEY).is_none());
    }
}
