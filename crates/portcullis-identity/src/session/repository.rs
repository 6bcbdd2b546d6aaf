//! Session database repository.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use super::models::{NewSession, Session};

/// Session store failures.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No session matches the given token. Also the result of deleting an
    /// already-deleted session: callers must be able to tell "already logged
    /// out" from "logged out just now".
    #[error("session not found")]
    NotFound,

    /// The source address does not parse as an IP. A session with no
    /// auditable origin is rejected before any I/O.
    #[error("invalid source address: {0}")]
    InvalidSourceAddress(String),

    /// Store-level failure, including the UNIQUE(token) violation raised when
    /// two sessions are created for the same token.
    #[error("session store error: {0}")]
    Database(#[from] sqlx::Error),
}

impl SessionError {
    /// True when the store rejected a second session for an existing token.
    pub fn is_duplicate_token(&self) -> bool {
        match self {
            SessionError::Database(sqlx::Error::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }
}

/// Repository for session persistence.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    /// Create a new repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a new session, assigning its ID and creation timestamp.
    pub async fn create(&self, new_session: NewSession) -> Result<Session, SessionError> {
        let source_ip: IpAddr = new_session
            .source_ip
            .trim()
            .parse()
            .map_err(|_| SessionError::InvalidSourceAddress(new_session.source_ip.clone()))?;

        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id: new_session.user_id,
            token: new_session.token,
            created_at: Utc::now(),
            expires_at: new_session.expires_at,
            source_ip: source_ip.to_string(),
        };

        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, token, created_at, expires_at, source_ip)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(&session.token)
        .bind(session.created_at)
        .bind(session.expires_at)
        .bind(&session.source_ip)
        .execute(&self.pool)
        .await?;

        Ok(session)
    }

    /// Look up the session for a token.
    pub async fn find_by_token(&self, token: &str) -> Result<Session, SessionError> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT id, user_id, token, created_at, expires_at, source_ip
            FROM sessions
            WHERE token = ?
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        session.ok_or(SessionError::NotFound)
    }

    /// List a user's sessions, newest first.
    pub async fn list_by_user(&self, user_id: &str) -> Result<Vec<Session>, SessionError> {
        let sessions = sqlx::query_as::<_, Session>(
            r#"
            SELECT id, user_id, token, created_at, expires_at, source_ip
            FROM sessions
            WHERE user_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    /// Delete the session for a token. Zero matching rows is `NotFound`,
    /// never a silent success.
    pub async fn delete_by_token(&self, token: &str) -> Result<(), SessionError> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(SessionError::NotFound);
        }
        Ok(())
    }

    /// Remove sessions whose expiry is at or before `now`. Returns the number
    /// of rows swept.
    pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, SessionError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
