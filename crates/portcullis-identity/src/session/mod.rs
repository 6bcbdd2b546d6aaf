//! Revocable sessions: one record per issued token.

mod models;
mod repository;
mod service;

pub use models::{NewSession, Session};
pub use repository::{SessionError, SessionRepository};
pub use service::{LoginGrant, SessionService};
