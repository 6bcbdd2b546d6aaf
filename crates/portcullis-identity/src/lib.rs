//! Identity service library.
//!
//! Issues short-lived signed tokens at login, keeps one revocable session
//! record per issued token, and deletes that record at logout. Token expiry is
//! the token's own business; the session row exists so a credential can be
//! revoked before it expires.

pub mod api;
pub mod config;
pub mod db;
pub mod directory;
pub mod error;
pub mod session;
