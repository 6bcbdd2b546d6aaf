//! Configured user directory.
//!
//! Stands in for the external user store this service consumes an
//! authenticated identity from: a list of registered users with bcrypt
//! password hashes, loaded from configuration at startup.

use log::warn;
use serde::{Deserialize, Serialize};

use portcullis_auth::Identifier;

use crate::error::Error;

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryUser {
    /// Canonical user ID (the token subject).
    pub id: String,
    /// Login name.
    pub login: String,
    /// Optional display name carried into issued tokens.
    #[serde(default)]
    pub display_name: Option<String>,
    /// bcrypt hash of the user's password.
    pub password_hash: String,
}

impl DirectoryUser {
    /// Verify a password against the stored bcrypt hash.
    pub fn verify_password(&self, password: &str) -> bool {
        bcrypt::verify(password, &self.password_hash).unwrap_or_else(|err| {
            warn!("bcrypt verification failed for user {}: {err}", self.id);
            false
        })
    }
}

/// The set of users allowed to log in.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    users: Vec<DirectoryUser>,
}

impl Directory {
    pub fn new(users: Vec<DirectoryUser>) -> Self {
        Self { users }
    }

    /// Find a user by canonical ID or by login name.
    pub fn find(&self, identifier: &Identifier) -> Option<&DirectoryUser> {
        self.users.iter().find(|user| match identifier {
            Identifier::UserId(id) => user.id == id.to_string(),
            Identifier::Login(login) => user.login == *login,
        })
    }

    /// Authenticate a login attempt. The response does not distinguish an
    /// unknown user from a wrong password.
    pub fn authenticate(&self, identifier: &str, password: &str) -> Result<&DirectoryUser, Error> {
        let identifier = Identifier::parse(identifier)?;
        let user = self.find(&identifier).ok_or(Error::InvalidCredentials)?;
        if !user.verify_password(password) {
            return Err(Error::InvalidCredentials);
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> Directory {
        // Minimum cost keeps the test fast; real deployments hash at default cost.
        let hash = bcrypt::hash("Password123", 4).unwrap();
        Directory::new(vec![DirectoryUser {
            id: "7d2f64f5-2c1a-4f7e-9b1d-0a3c45e6f789".to_string(),
            login: "alice".to_string(),
            display_name: Some("Alice".to_string()),
            password_hash: hash,
        }])
    }

    #[test]
    fn authenticates_by_login() {
        let dir = directory();
        let user = dir.authenticate("alice", "Password123").unwrap();
        assert_eq!(user.login, "alice");
    }

    #[test]
    fn authenticates_by_user_id() {
        let dir = directory();
        let user = dir
            .authenticate("7d2f64f5-2c1a-4f7e-9b1d-0a3c45e6f789", "Password123")
            .unwrap();
        assert_eq!(user.login, "alice");
    }

    #[test]
    fn wrong_password_and_unknown_user_are_indistinguishable() {
        let dir = directory();
        let a = dir.authenticate("alice", "wrong").unwrap_err();
        let b = dir.authenticate("mallory", "Password123").unwrap_err();
        assert!(matches!(a, Error::InvalidCredentials));
        assert!(matches!(b, Error::InvalidCredentials));
    }

    #[test]
    fn malformed_identifier_is_a_validation_error() {
        let dir = directory();
        let err = dir.authenticate("not-a-uuid", "Password123").unwrap_err();
        assert!(matches!(err, Error::Identifier(_)));
    }
}
