//! Typed token claims.

use serde::{Deserialize, Serialize};

/// The claims body of a signed token.
///
/// This struct is only ever produced by the issuance path or by the validated
/// decode path in [`crate::TokenVerifier`]; there is no way for an unchecked
/// claim to turn into a zero-value identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (the authenticated user ID). Required and non-empty for a
    /// token to verify; defaulted on decode so its absence is reported as a
    /// missing-subject rejection rather than a parse failure.
    #[serde(default)]
    pub sub: String,

    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Issued at (Unix timestamp, seconds).
    #[serde(default)]
    pub iat: i64,

    /// Expiration (Unix timestamp, seconds). Always strictly later than
    /// `iat` for issued tokens.
    #[serde(default)]
    pub exp: i64,

    /// Not before (Unix timestamp, seconds). Checked only when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
}

impl Claims {
    /// True when the subject claim is absent or blank.
    pub fn subject_is_blank(&self) -> bool {
        self.sub.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_with_missing_optional_fields() {
        let claims: Claims = serde_json::from_str(r#"{"exp": 100, "iat": 50}"#).unwrap();
        assert!(claims.subject_is_blank());
        assert_eq!(claims.name, None);
        assert_eq!(claims.nbf, None);
        assert_eq!(claims.exp, 100);
    }

    #[test]
    fn blank_subject_detection() {
        let mut claims: Claims = serde_json::from_str(r#"{"sub": "u-1", "exp": 1}"#).unwrap();
        assert!(!claims.subject_is_blank());

        claims.sub = "   ".to_string();
        assert!(claims.subject_is_blank());
    }

    #[test]
    fn optional_fields_are_not_serialized_when_absent() {
        let claims = Claims {
            sub: "u-1".into(),
            name: None,
            iat: 1,
            exp: 2,
            nbf: None,
        };
        let json = serde_json::to_string(&claims).unwrap();
        assert!(!json.contains("name"));
        assert!(!json.contains("nbf"));
    }
}
