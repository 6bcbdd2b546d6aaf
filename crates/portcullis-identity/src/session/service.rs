//! Session service - login, logout and session checks.

use chrono::Utc;
use log::{info, warn};

use portcullis_auth::{TokenIssuer, TokenVerifier, strip_bearer};

use crate::error::Error;

use super::models::{NewSession, Session};
use super::repository::SessionRepository;

/// The result of a successful login: the signed token and its session record.
#[derive(Debug, Clone)]
pub struct LoginGrant {
    pub token: String,
    pub session: Session,
}

/// Orchestrates token issuance against the session store.
#[derive(Clone)]
pub struct SessionService {
    issuer: TokenIssuer,
    verifier: TokenVerifier,
    repo: SessionRepository,
}

impl SessionService {
    pub fn new(issuer: TokenIssuer, verifier: TokenVerifier, repo: SessionRepository) -> Self {
        Self {
            issuer,
            verifier,
            repo,
        }
    }

    /// Issue a token for an already-authenticated subject and record its
    /// session. The session's expiry is the token's own signed expiry.
    pub async fn login(
        &self,
        subject: &str,
        display_name: Option<&str>,
        source_ip: &str,
    ) -> Result<LoginGrant, Error> {
        let issued = self.issuer.issue(subject, display_name)?;

        let session = self
            .repo
            .create(NewSession {
                user_id: subject.to_string(),
                token: issued.token.clone(),
                expires_at: issued.expires_at,
                source_ip: source_ip.to_string(),
            })
            .await
            .inspect_err(|err| {
                if err.is_duplicate_token() {
                    warn!("session already exists for a token issued to {subject}");
                }
            })?;

        info!("created session {} for {subject}", session.id);

        Ok(LoginGrant {
            token: issued.token,
            session,
        })
    }

    /// Delete the session for a presented bearer token. Deleting an unknown
    /// token is `SessionNotFound`, so callers can distinguish "already logged
    /// out" from "logged out just now".
    pub async fn logout(&self, bearer: &str) -> Result<(), Error> {
        let token = strip_bearer(bearer);
        if token.is_empty() {
            return Err(portcullis_auth::AuthError::MalformedToken.into());
        }

        self.repo.delete_by_token(token).await?;
        info!("session deleted on logout");
        Ok(())
    }

    /// Verify a bearer token *and* require its live session row. Used by the
    /// introspection endpoint: a cryptographically valid token whose session
    /// was revoked does not pass.
    pub async fn authenticate(&self, bearer: &str) -> Result<Session, Error> {
        let identity = self.verifier.verify(bearer)?;
        let session = self.repo.find_by_token(strip_bearer(bearer)).await?;

        // The row's expiry mirrors the token's exp, which verification has
        // already checked; this guards the revocation authority itself.
        if session.is_expired_at(Utc::now()) {
            return Err(portcullis_auth::AuthError::Expired.into());
        }

        debug_assert_eq!(session.user_id, identity.subject());
        Ok(session)
    }

    /// Sweep sessions whose expiry has passed.
    pub async fn purge_expired(&self) -> Result<u64, Error> {
        let swept = self.repo.delete_expired(Utc::now()).await?;
        if swept > 0 {
            info!("purged {swept} expired sessions");
        }
        Ok(swept)
    }
}
