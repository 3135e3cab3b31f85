//! Permission query caching with TTL and in-flight deduplication.
//!
//! The cache wraps the [`AuthorizationGateway`] and is the only component
//! that talks to it. It provides:
//!
//! - **TTL-based storage** via Moka: a fresh entry answers without a
//!   network call, an expired entry is evicted lazily on read.
//! - **In-flight deduplication**: concurrent queries for the same key
//!   share one underlying call via a singleflight table; the slot is
//!   removed on both success and failure so a later call can retry.
//! - **Session-expiry handling**: a 401 from the gateway clears the
//!   entire cache before the error is re-raised, because any previously
//!   cached permission data is suspect after session loss. Any other
//!   failure leaves the cache untouched.
//!
//! # Metrics
//!
//! - `ligahub_authz_cache_hits_total` / `ligahub_authz_cache_misses_total`
//! - `ligahub_authz_cache_invalidations_total`

mod singleflight;

use std::time::Duration;

use ligahub_domain::{AuthzResult, PermissionQuery, PermissionQueryResult, QueryKey};
use moka::future::Cache;

use crate::gateway::AuthorizationGateway;
use crate::transport::AuthorizationTransport;
use singleflight::{Singleflight, SingleflightGuard, SingleflightSlot};

const CACHE_HITS: &str = "ligahub_authz_cache_hits_total";
const CACHE_MISSES: &str = "ligahub_authz_cache_misses_total";
const CACHE_INVALIDATIONS: &str = "ligahub_authz_cache_invalidations_total";

/// Configuration for the permission query cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// Maximum number of entries in the cache.
    pub max_capacity: u64,
    /// Time entries stay servable after a successful fetch.
    pub ttl: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            ttl: Duration::from_secs(120),
        }
    }
}

impl CacheSettings {
    /// Sets the maximum capacity.
    pub fn with_max_capacity(mut self, max_capacity: u64) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    /// Sets the entry TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// TTL cache plus in-flight deduplication over the gateway.
///
/// Thread-safe; share it behind an `Arc` across tasks.
pub struct AuthzCache<T> {
    gateway: AuthorizationGateway<T>,
    cache: Cache<QueryKey, PermissionQueryResult>,
    singleflight: Singleflight<QueryKey, AuthzResult<PermissionQueryResult>>,
    settings: CacheSettings,
}

impl<T> AuthzCache<T>
where
    T: AuthorizationTransport,
{
    /// Creates a cache over the given gateway.
    pub fn new(gateway: AuthorizationGateway<T>, settings: CacheSettings) -> Self {
        let cache = Cache::builder()
            .max_capacity(settings.max_capacity)
            .time_to_live(settings.ttl)
            .build();

        Self {
            gateway,
            cache,
            singleflight: Singleflight::new(),
            settings,
        }
    }

    /// Returns the settings for this cache instance.
    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// Resolves a permission query, consulting the cache first.
    ///
    /// A fresh entry answers without a network call. On a miss, concurrent
    /// callers for the same key share one gateway call and receive the
    /// same outcome.
    ///
    /// # Errors
    ///
    /// Gateway failures are re-raised to every sharing caller. A 401
    /// additionally clears the whole cache before propagating.
    pub async fn query(&self, query: &PermissionQuery) -> AuthzResult<PermissionQueryResult> {
        let normalized = query.normalized();
        let key = QueryKey::of(&normalized);
        self.query_by_key(key, normalized).await
    }

    async fn query_by_key(
        &self,
        key: QueryKey,
        query: PermissionQuery,
    ) -> AuthzResult<PermissionQueryResult> {
        if let Some(hit) = self.cache.get(&key).await {
            metrics::counter!(CACHE_HITS).increment(1);
            return Ok(hit);
        }
        metrics::counter!(CACHE_MISSES).increment(1);

        match self.singleflight.acquire(key.clone()) {
            SingleflightSlot::Follower(mut receiver) => {
                match receiver.recv().await {
                    Ok(outcome) => outcome,
                    // Leader was dropped (likely panicked); retry as a new
                    // leader. Safe because the guard cleaned up the slot.
                    Err(_) => Box::pin(self.query_by_key(key, query)).await,
                }
            }
            SingleflightSlot::Leader(sender) => {
                let guard = SingleflightGuard::new(&self.singleflight, key.clone());

                let outcome = self.gateway.query(&query).await;
                match &outcome {
                    Ok(value) => {
                        self.cache.insert(key.clone(), value.clone()).await;
                    }
                    Err(err) if err.is_unauthorized() => {
                        tracing::warn!("permission query answered 401, clearing cache");
                        self.clear();
                    }
                    Err(_) => {}
                }

                // Broadcast to any waiters (send errors mean no followers).
                let _ = sender.send(outcome.clone());
                guard.complete();

                outcome
            }
        }
    }

    /// Empties the cache unconditionally.
    ///
    /// The next `query` for any key forces a fresh network call.
    pub fn clear(&self) {
        self.cache.invalidate_all();
        metrics::counter!(CACHE_INVALIDATIONS).increment(1);
    }

    /// Returns the approximate number of entries in the cache.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Runs pending maintenance tasks.
    ///
    /// This triggers any pending evictions. Useful for testing TTL behavior.
    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }
}

/// Registers cache metric descriptions.
///
/// Call once during application startup; optional, but gives the counters
/// descriptions in Prometheus/Grafana.
pub fn register_authz_cache_metrics() {
    metrics::describe_counter!(CACHE_HITS, "Total number of permission cache hits");
    metrics::describe_counter!(CACHE_MISSES, "Total number of permission cache misses");
    metrics::describe_counter!(
        CACHE_INVALIDATIONS,
        "Total number of full permission cache invalidations"
    );
}
