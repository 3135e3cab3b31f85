//! Shared test utilities for the authorization client tests.

// Allow dead_code because helpers are used across different test files,
// but each test file compiles independently and can't see cross-file usage.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ligahub_authz::cache::{AuthzCache, CacheSettings};
use ligahub_authz::gateway::AuthorizationGateway;
use ligahub_authz::store::PermissionStore;
use ligahub_authz::transport::AuthorizationTransport;
use ligahub_domain::{
    AuthzResult, PermissionQuery, PermissionQueryResult, ScopePermissions, ScopeType,
};

/// Maximum time to wait in polling loops before declaring failure.
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Interval between polling attempts.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

pub type Responder =
    dyn Fn(&PermissionQuery) -> AuthzResult<PermissionQueryResult> + Send + Sync;

/// Scriptable transport that counts invocations.
pub struct MockTransport {
    calls: AtomicUsize,
    delay: Option<Duration>,
    responder: Box<Responder>,
}

impl MockTransport {
    pub fn new(
        responder: impl Fn(&PermissionQuery) -> AuthzResult<PermissionQueryResult>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay: None,
            responder: Box::new(responder),
        }
    }

    /// Adds an artificial network latency to every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of transport invocations so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthorizationTransport for MockTransport {
    async fn post_permission_query(
        &self,
        query: &PermissionQuery,
    ) -> AuthzResult<PermissionQueryResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.responder)(query)
    }
}

/// Builds a breakdown result from string slices.
pub fn breakdown(
    scope_type: ScopeType,
    all_permissions: &[&str],
    results: &[(i64, &[&str])],
) -> PermissionQueryResult {
    PermissionQueryResult::Breakdown {
        scope_type,
        all: false,
        all_permissions: all_permissions.iter().map(|p| (*p).to_string()).collect(),
        results: results
            .iter()
            .map(|(scope_id, permissions)| ScopePermissions {
                scope_id: *scope_id,
                permissions: permissions.iter().map(|p| (*p).to_string()).collect(),
            })
            .collect(),
    }
}

/// Responder that answers every breakdown query like the portal API:
/// one wildcard permission plus `scope.<id>` for every requested id.
pub fn portal_responder(query: &PermissionQuery) -> AuthzResult<PermissionQueryResult> {
    Ok(PermissionQueryResult::Breakdown {
        scope_type: query.scope_type,
        all: false,
        all_permissions: vec!["portal.read".to_string()],
        results: query
            .scope_ids
            .iter()
            .map(|id| ScopePermissions {
                scope_id: *id,
                permissions: vec![format!("scope.{id}")],
            })
            .collect(),
    })
}

/// Creates a cache over the given mock transport.
pub fn cache_over(
    transport: &Arc<MockTransport>,
    settings: CacheSettings,
) -> Arc<AuthzCache<MockTransport>> {
    let gateway = AuthorizationGateway::new(Arc::clone(transport));
    Arc::new(AuthzCache::new(gateway, settings))
}

/// Creates a permission store (with a default-settings cache) over the
/// given mock transport.
pub fn store_over(transport: &Arc<MockTransport>) -> Arc<PermissionStore<MockTransport>> {
    Arc::new(PermissionStore::new(cache_over(
        transport,
        CacheSettings::default(),
    )))
}

/// Polls `condition` until it holds or `WAIT_TIMEOUT` elapses.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + WAIT_TIMEOUT;
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within {WAIT_TIMEOUT:?}"
        );
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
