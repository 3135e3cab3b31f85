//! Stateless gateway that normalizes queries before transmission.

use std::sync::Arc;

use ligahub_domain::{AuthzResult, PermissionQuery, PermissionQueryResult};

use crate::transport::AuthorizationTransport;

/// Normalizes a permission query and performs the remote call.
///
/// One network call per invocation; no caching, no retries. Transport
/// errors are propagated verbatim.
pub struct AuthorizationGateway<T> {
    transport: Arc<T>,
}

impl<T> Clone for AuthorizationGateway<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T> AuthorizationGateway<T>
where
    T: AuthorizationTransport,
{
    /// Creates a gateway over the given transport.
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Sends the normalized form of `query` to the remote endpoint.
    ///
    /// The caller's query is not mutated; sorting happens on a copy so
    /// that logically equal queries hit the wire identically.
    ///
    /// # Errors
    ///
    /// Propagates transport errors (status code + payload) unchanged.
    pub async fn query(&self, query: &PermissionQuery) -> AuthzResult<PermissionQueryResult> {
        let normalized = query.normalized();
        self.transport.post_permission_query(&normalized).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use ligahub_domain::{AuthzError, ScopeType};

    use super::*;

    /// Mock transport that records the query it receives.
    struct RecordingTransport {
        received: Mutex<Option<PermissionQuery>>,
        outcome: AuthzResult<PermissionQueryResult>,
    }

    impl RecordingTransport {
        fn new(outcome: AuthzResult<PermissionQueryResult>) -> Self {
            Self {
                received: Mutex::new(None),
                outcome,
            }
        }
    }

    #[async_trait]
    impl AuthorizationTransport for RecordingTransport {
        async fn post_permission_query(
            &self,
            query: &PermissionQuery,
        ) -> AuthzResult<PermissionQueryResult> {
            *self.received.lock().unwrap() = Some(query.clone());
            self.outcome.clone()
        }
    }

    fn summary(scope_type: ScopeType) -> PermissionQueryResult {
        PermissionQueryResult::Summary {
            scope_type,
            all: true,
            scope_ids: vec![1],
        }
    }

    #[tokio::test]
    async fn the_wire_query_is_sorted_while_the_callers_is_untouched() {
        // Arrange
        let transport = Arc::new(RecordingTransport::new(Ok(summary(ScopeType::Association))));
        let gateway = AuthorizationGateway::new(Arc::clone(&transport));
        let query = PermissionQuery::new(ScopeType::Association)
            .with_scope_ids(vec![5, 2, 9])
            .with_permissions(vec!["b".to_string(), "a".to_string()]);

        // Act
        gateway.query(&query).await.unwrap();

        // Assert
        let sent = transport.received.lock().unwrap().clone().unwrap();
        assert_eq!(sent.scope_ids, vec![2, 5, 9]);
        assert_eq!(sent.permissions, vec!["a", "b"]);
        assert_eq!(query.scope_ids, vec![5, 2, 9]);
        assert_eq!(query.permissions, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn transport_errors_pass_through_verbatim() {
        let err = AuthzError::Transport {
            status: Some(502),
            message: "bad gateway".to_string(),
        };
        let transport = Arc::new(RecordingTransport::new(Err(err.clone())));
        let gateway = AuthorizationGateway::new(transport);

        let result = gateway
            .query(&PermissionQuery::new(ScopeType::Global))
            .await;

        assert_eq!(result.unwrap_err(), err);
    }
}
