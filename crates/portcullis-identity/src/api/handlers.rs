//! Authentication handlers.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    Json,
    extract::{ConnectInfo, FromRequestParts, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION, request::Parts},
};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use portcullis_auth::AuthError;

use crate::error::Error;
use crate::session::SessionError;

use super::state::AppState;

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

/// Login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Session introspection response.
#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// The caller's source address: first hop of `X-Forwarded-For` when present,
/// otherwise the peer address. Never fails by itself; a login with no
/// derivable origin is rejected downstream as an invalid source address.
pub struct ClientIp(pub Option<String>);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let ip = forwarded.or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|info| info.0.ip().to_string())
        });

        Ok(ClientIp(ip))
    }
}

/// Log in: check credentials against the directory, issue a token, record the
/// session.
///
/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    client_ip: ClientIp,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, Error> {
    let user = state.directory.authenticate(&request.login, &request.password)?;

    let source_ip = client_ip
        .0
        .ok_or_else(|| Error::Session(SessionError::InvalidSourceAddress("unknown".to_string())))?;

    let grant = state
        .sessions
        .login(&user.id, user.display_name.as_deref(), &source_ip)
        .await?;

    info!("user {} logged in from {}", user.id, grant.session.source_ip);
    Ok(Json(LoginResponse { token: grant.token }))
}

/// Log out: delete the session for the presented token.
///
/// POST /auth/logout
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, Error> {
    let bearer = bearer_header(&headers)?;
    state.sessions.logout(bearer).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Introspect the session behind a token: valid signature and claims, plus a
/// live (unrevoked) session row.
///
/// GET /auth/session
pub async fn current_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionInfo>, Error> {
    let bearer = bearer_header(&headers)?;
    let session = state.sessions.authenticate(bearer).await?;

    Ok(Json(SessionInfo {
        user_id: session.user_id,
        created_at: session.created_at,
        expires_at: session.expires_at,
    }))
}

/// Health check.
///
/// GET /healthz
pub async fn health() -> &'static str {
    "ok"
}

fn bearer_header(headers: &HeaderMap) -> Result<&str, Error> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(Error::Auth(AuthError::MissingToken))?;
    value
        .to_str()
        .map_err(|_| Error::Auth(AuthError::MalformedToken))
}
