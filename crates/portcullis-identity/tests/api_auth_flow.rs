//! End-to-end login/logout flow over the HTTP surface.

use axum::http::{HeaderName, HeaderValue, StatusCode, header::AUTHORIZATION};
use axum_test::TestServer;
use chrono::TimeDelta;
use serde_json::{Value, json};

use portcullis_auth::{SigningKey, TokenIssuer, TokenVerifier, VerificationKey};
use portcullis_identity::api::{AppState, create_router};
use portcullis_identity::db::Database;
use portcullis_identity::directory::{Directory, DirectoryUser};
use portcullis_identity::session::{SessionRepository, SessionService};

const PRIVATE_PEM: &str = include_str!("../testdata/rsa_test_key.pem");
const PUBLIC_PEM: &str = include_str!("../testdata/rsa_test_key.pub.pem");

const ALICE_ID: &str = "7d2f64f5-2c1a-4f7e-9b1d-0a3c45e6f789";

fn forwarded_for(value: &'static str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-forwarded-for"),
        HeaderValue::from_static(value),
    )
}

fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        AUTHORIZATION,
        HeaderValue::try_from(format!("Bearer {token}")).unwrap(),
    )
}

async fn test_server(ttl: TimeDelta) -> TestServer {
    let db = Database::in_memory().await.unwrap();
    let issuer = TokenIssuer::new(SigningKey::from_pem(PRIVATE_PEM.as_bytes()).unwrap(), ttl);
    let verifier = TokenVerifier::new(VerificationKey::from_pem(PUBLIC_PEM.as_bytes()).unwrap());
    let sessions = SessionService::new(issuer, verifier, SessionRepository::new(db.pool().clone()));

    let directory = Directory::new(vec![DirectoryUser {
        id: ALICE_ID.to_string(),
        login: "alice".to_string(),
        display_name: Some("Alice".to_string()),
        password_hash: bcrypt::hash("Password123", 4).unwrap(),
    }]);

    TestServer::new(create_router(AppState::new(sessions, directory))).unwrap()
}

async fn login(server: &TestServer) -> String {
    let (name, value) = forwarded_for("203.0.113.7");
    let response = server
        .post("/auth/login")
        .add_header(name, value)
        .json(&json!({ "login": "alice", "password": "Password123" }))
        .await;
    response.assert_status(StatusCode::OK);
    response.json::<Value>()["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn login_session_logout_round_trip() {
    let server = test_server(TimeDelta::minutes(3)).await;
    let token = login(&server).await;

    // The token maps back to a live session.
    let (name, value) = bearer(&token);
    let response = server.get("/auth/session").add_header(name, value).await;
    response.assert_status(StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["user_id"], ALICE_ID);

    // Logout revokes it.
    let (name, value) = bearer(&token);
    let response = server.post("/auth/logout").add_header(name, value).await;
    response.assert_status(StatusCode::NO_CONTENT);

    // The session is gone for introspection...
    let (name, value) = bearer(&token);
    let response = server.get("/auth/session").add_header(name, value).await;
    response.assert_status(StatusCode::NOT_FOUND);

    // ...and a second logout is distinguishable from success.
    let (name, value) = bearer(&token);
    let response = server.post("/auth/logout").add_header(name, value).await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error_code"], "session_not_found");
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let server = test_server(TimeDelta::minutes(3)).await;
    let (name, value) = forwarded_for("203.0.113.7");
    let response = server
        .post("/auth/login")
        .add_header(name, value)
        .json(&json!({ "login": "alice", "password": "nope" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error_code"], "invalid_credentials");
}

#[tokio::test]
async fn malformed_login_is_a_validation_error() {
    let server = test_server(TimeDelta::minutes(3)).await;
    let (name, value) = forwarded_for("203.0.113.7");
    let response = server
        .post("/auth/login")
        .add_header(name, value)
        .json(&json!({ "login": "a b", "password": "Password123" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error_code"], "invalid_login");
}

#[tokio::test]
async fn unparsable_forwarded_address_rejects_the_login() {
    let server = test_server(TimeDelta::minutes(3)).await;
    let (name, value) = forwarded_for("banana");
    let response = server
        .post("/auth/login")
        .add_header(name, value)
        .json(&json!({ "login": "alice", "password": "Password123" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error_code"], "invalid_source_address");
}

#[tokio::test]
async fn logout_without_credential_is_missing_token() {
    let server = test_server(TimeDelta::minutes(3)).await;
    let response = server.post("/auth/logout").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error_code"], "missing_token");
}

#[tokio::test]
async fn garbage_bearer_is_malformed() {
    let server = test_server(TimeDelta::minutes(3)).await;
    let (name, value) = bearer("this.is.not.a.jwt");
    let response = server.get("/auth/session").add_header(name, value).await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error_code"], "malformed_token");
}

#[tokio::test]
async fn expired_token_is_reported_as_expired() {
    let server = test_server(TimeDelta::seconds(-5)).await;
    let token = login(&server).await;

    let (name, value) = bearer(&token);
    let response = server.get("/auth/session").add_header(name, value).await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error_code"], "token_expired");
}

#[tokio::test]
async fn health_is_public() {
    let server = test_server(TimeDelta::minutes(3)).await;
    let response = server.get("/healthz").await;
    response.assert_status(StatusCode::OK);
}
