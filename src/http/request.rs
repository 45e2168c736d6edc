//! Request identifiers.
//!
//! # Responsibilities
//! - Generate a fresh identifier for requests that start a chain
//! - Carry an upstream-supplied identifier (the upload filename) across hops
//!
//! # Design Decisions
//! - Fresh identifiers are UUID v7: time-ordered with random low bits
//! - The identifier is the only key correlating an accepted request with its
//!   deferred forward

use std::fmt;

/// Response header echoing the identifier back to the caller.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Opaque identifier correlating a request across chain hops.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a new identifier for a request that starts a chain.
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().simple().to_string())
    }

    /// Adopt an identifier supplied by the previous hop.
    pub fn from_upstream(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
