//! Service-level error type with structured HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::{error, warn};
use serde::Serialize;
use thiserror::Error;

use portcullis_auth::{AuthError, IdentifierError, IssueError};

use crate::session::SessionError;

/// Errors surfaced by the identity service.
#[derive(Debug, Error)]
pub enum Error {
    /// Unknown user or wrong password. Deliberately one variant for both so
    /// the response does not reveal which half failed.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("issuing token: {0}")]
    Issue(#[from] IssueError),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            Error::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "invalid_credentials", "invalid credentials".to_string())
            }
            Error::Identifier(err) => (StatusCode::BAD_REQUEST, "invalid_login", err.to_string()),
            Error::Auth(err) => return auth_response(err),
            Error::Session(SessionError::NotFound) => {
                (StatusCode::NOT_FOUND, "session_not_found", "session not found".to_string())
            }
            Error::Session(SessionError::InvalidSourceAddress(addr)) => (
                StatusCode::BAD_REQUEST,
                "invalid_source_address",
                format!("invalid source address: {addr}"),
            ),
            Error::Session(SessionError::Database(err)) => {
                error!("session store failure: {err}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error".to_string())
            }
            Error::Issue(err) => {
                error!("token issuance failure: {err}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error".to_string())
            }
        };

        let body = Json(ErrorResponse {
            error: message,
            error_code: error_code.to_string(),
        });
        (status, body).into_response()
    }
}

/// Map a credential rejection to a response.
///
/// The precise reason always goes to the log; reasons that would hand an
/// attacker a probing oracle (wrong algorithm, bad signature) collapse to one
/// generic `invalid_token` response.
fn auth_response(err: &AuthError) -> Response {
    if err.is_operational() {
        error!("authentication unavailable: {err}");
    } else {
        warn!("rejected credential: {err}");
    }

    let (status, error_code, message) = match err {
        AuthError::MissingToken => {
            (StatusCode::UNAUTHORIZED, "missing_token", "missing authorization token")
        }
        AuthError::MalformedToken => {
            (StatusCode::UNAUTHORIZED, "malformed_token", "invalid authorization header format")
        }
        AuthError::Expired => (StatusCode::UNAUTHORIZED, "token_expired", "token has expired"),
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

    let body = Json(ErrorResponse {
        error: message.to_string(),
        error_code: error_code.to_string(),
    });
    (status, body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_and_signature_failures_share_one_response() {
        let a = Error::Auth(AuthError::UnsupportedAlgorithm { alg: "HS256".into() });
        let b = Error::Auth(AuthError::SignatureInvalid);
        assert_eq!(a.into_response().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(b.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn not_configured_is_a_server_error() {
        let response = Error::Auth(AuthError::NotConfigured).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn session_not_found_is_404() {
        let response = Error::Session(SessionError::NotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
