//! HTTP transport for the remote permission endpoint.
//!
//! The transport is a stateless seam: it posts one JSON body per call and
//! maps failures into the [`AuthzError`] taxonomy. Retries, backoff and
//! timeouts beyond the per-request timeout belong to the HTTP stack, not
//! to this layer.
//!
//! # Session-expiry signal
//!
//! Any 401 answered here is treated upstream as session loss and clears
//! the permission cache. The exception is the pre-authentication probe
//! paths in [`SESSION_PROBE_PATHS`]: a 401 there is the expected answer
//! for an unauthenticated client, so it is reported as a plain transport
//! failure and never triggers the session-expiry handling.

use std::time::Duration;

use async_trait::async_trait;
use ligahub_domain::{AuthzError, AuthzResult, PermissionQuery, PermissionQueryResult};

use crate::config::ApiSettings;

/// Pre-authentication probe paths where a 401 is the expected answer.
pub const SESSION_PROBE_PATHS: &[&str] = &["auth/session", "auth/refresh"];

/// Returns `true` if `path` is a pre-authentication probe.
pub fn is_session_probe(path: &str) -> bool {
    let path = path.trim_start_matches('/');
    SESSION_PROBE_PATHS.iter().any(|probe| path == *probe)
}

/// Maps a non-success HTTP status into the error taxonomy.
///
/// `path` is the request path relative to the API base; it decides whether
/// a 401 counts as session loss or as an expected probe answer.
pub fn classify_http_failure(path: &str, status: u16, body: String) -> AuthzError {
    match status {
        401 if !is_session_probe(path) => AuthzError::Unauthorized { message: body },
        400 | 422 => AuthzError::Validation { message: body },
        _ => AuthzError::Transport {
            status: Some(status),
            message: body,
        },
    }
}

/// Abstract transport for permission queries.
///
/// Implementations must be thread-safe; the production implementation is
/// [`HttpTransport`], tests substitute mocks.
#[async_trait]
pub trait AuthorizationTransport: Send + Sync + 'static {
    /// Performs one remote call with the given (already normalized) query.
    async fn post_permission_query(
        &self,
        query: &PermissionQuery,
    ) -> AuthzResult<PermissionQueryResult>;
}

/// reqwest-based transport posting queries to the configured endpoint.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    query_path: String,
}

impl HttpTransport {
    /// Builds a transport from API settings.
    ///
    /// # Errors
    ///
    /// Returns a transport error when the underlying HTTP client cannot be
    /// constructed.
    pub fn new(settings: &ApiSettings) -> AuthzResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|err| AuthzError::Transport {
                status: None,
                message: err.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            query_path: settings.query_path.trim_start_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/{}", self.base_url, self.query_path)
    }
}

#[async_trait]
impl AuthorizationTransport for HttpTransport {
    async fn post_permission_query(
        &self,
        query: &PermissionQuery,
    ) -> AuthzResult<PermissionQueryResult> {
        let response = self
            .client
            .post(self.endpoint())
            .json(query)
            .send()
            .await
            .map_err(|err| AuthzError::Transport {
                status: None,
                message: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), "permission query failed");
            return Err(classify_http_failure(&self.query_path, status.as_u16(), body));
        }

        response
            .json::<PermissionQueryResult>()
            .await
            .map_err(|err| AuthzError::Decode {
                message: err.to_string(),
            })
    }
}
