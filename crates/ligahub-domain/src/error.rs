//! Error taxonomy at the transport boundary.
//!
//! Variants are `Clone` because results are fanned out to concurrent
//! callers over a broadcast channel when in-flight requests are shared.

use thiserror::Error;

/// Errors surfaced by the authorization client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
    /// The session is no longer valid (HTTP 401).
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// The server rejected the request as malformed (HTTP 400/422).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Network failure or an unexpected status code. The status and payload
    /// are carried verbatim.
    #[error("transport failure: {message}")]
    Transport { status: Option<u16>, message: String },

    /// The response body did not match either expected shape.
    #[error("malformed response: {message}")]
    Decode { message: String },
}

impl AuthzError {
    /// Whether this error signals session loss.
    ///
    /// A 401 invalidates all previously cached permission data.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AuthzError::Unauthorized { .. })
    }
}

/// Result type for authorization operations.
pub type AuthzResult<T> = Result<T, AuthzError>;
