//! HTTP mapping for credential rejections.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::{error, warn};
use serde::Serialize;

use portcullis_auth::AuthError;

/// A terminated request: the gate refused the credential.
#[derive(Debug)]
pub struct AuthRejection(pub AuthError);

impl From<AuthError> for AuthRejection {
    fn from(err: AuthError) -> Self {
        Self(err)
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
struct RejectionBody {
    error: String,
    error_code: String,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        // The precise reason always reaches the log. What reaches the client
        // is coarser: revealing "wrong signing algorithm" or "bad signature"
        // hands a probing attacker an oracle, so both collapse to one generic
        // invalid-token response.
        if self.0.is_operational() {
            error!("authentication unavailable: {}", self.0);
        } else {
            warn!("rejected credential: {}", self.0);
        }

        let (status, error_code, message) = match &self.0 {
            AuthError::MissingToken => {
                (StatusCode::UNAUTHORIZED, "missing_token", "missing authorization token")
            }
            AuthError::MalformedToken => (
                StatusCode::UNAUTHORIZED,
                "malformed_token",
                "invalid authorization header format",
            ),
            AuthError::Expired => {
                (StatusCode::UNAUTHORIZED, "token_expired", "token has expired")
            }
            AuthError::NotYetValid => {
                (StatusCode::UNAUTHORIZED, "token_not_yet_valid", "token not yet valid")
            }
            AuthError::MissingSubject => {
                (StatusCode::UNAUTHORIZED, "invalid_claims", "invalid token claims")
            }
            AuthError::UnsupportedAlgorithm { .. } | AuthError::SignatureInvalid => {
                (StatusCode::UNAUTHORIZED, "invalid_token", "invalid token")
            }
            AuthError::NotConfigured => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "auth_not_configured",
                "authentication is unavailable",
            ),
        };

        let body = Json(RejectionBody {
            error: message.to_string(),
            error_code: error_code.to_string(),
        });
        (status, body).into_response()
    }
}
