//! Edge gateway library.
//!
//! Verifies each inbound bearer token once, at the edge, and carries the
//! verified subject into internal RPC calls as a plain metadata assertion.
//! No handler behind the gate runs without a verified identity; no internal
//! service ever re-verifies a signature.

pub mod auth;
pub mod config;
pub mod routes;
pub mod upstream;
