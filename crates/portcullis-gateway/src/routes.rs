//! Gateway route definitions.

use axum::{Json, Router, middleware, routing::get};
use serde::Serialize;

use crate::auth::{AuthState, CurrentUser, auth_middleware};

/// Who the gate says you are.
#[derive(Debug, Serialize)]
pub struct WhoamiResponse {
    pub subject: String,
}

/// Create the gateway router.
///
/// Everything mounted behind the auth layer only ever runs with a verified
/// identity in request extensions; business routes forwarding to internal
/// services hang off the same protected router.
pub fn create_router(auth: AuthState) -> Router {
    let protected = Router::new()
        .route("/whoami", get(whoami))
        .route_layer(middleware::from_fn_with_state(auth, auth_middleware));

    Router::new()
        .route("/healthz", get(health))
        .merge(protected)
}

/// Health check, reachable without credentials.
///
/// GET /healthz
async fn health() -> &'static str {
    "ok"
}

/// Echo the verified caller.
///
/// GET /whoami
async fn whoami(user: CurrentUser) -> Json<WhoamiResponse> {
    Json(WhoamiResponse {
        subject: user.subject().to_string(),
    })
}
