//! Session data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A persisted session record.
///
/// `expires_at` is copied from the issued token's own expiry at creation time:
/// the session is not an independent expiry authority, it is the revocation
/// mechanism layered on top of it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Unique session ID (UUIDv4).
    pub id: String,
    /// The user this session belongs to.
    pub user_id: String,
    /// The issued token. Natural key: one session per token.
    pub token: String,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the token (and therefore the session) expires.
    pub expires_at: DateTime<Utc>,
    /// Where the login came from.
    pub source_ip: String,
}

impl Session {
    /// Whether the session has outlived its token's expiry.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// The caller-supplied part of a new session; id and creation timestamp are
/// assigned by the repository.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub source_ip: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn expiry_check_is_inclusive() {
        let now = Utc::now();
        let session = Session {
            id: "s-1".into(),
            user_id: "u-1".into(),
            token: "t".into(),
            created_at: now - TimeDelta::minutes(3),
            expires_at: now,
            source_ip: "127.0.0.1".into(),
        };
        assert!(session.is_expired_at(now));
        assert!(!session.is_expired_at(now - TimeDelta::seconds(1)));
    }
}
