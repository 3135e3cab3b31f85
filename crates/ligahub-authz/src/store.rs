//! Effective-permission store for the active scope.
//!
//! Holds the deduplicated union of wildcard permissions (those applying
//! to every scope of the active type) and permissions specific to the
//! active scope id, and keeps it current as the user logs in/out and
//! navigates between scopes.
//!
//! # Superseded loads
//!
//! Scope can change again while a load is still in flight. Every load
//! takes a generation number and only the newest one may publish; a
//! slower, superseded load completes without touching the store. Each
//! load still emits exactly one load-completion event.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use ligahub_domain::{
    AuthzError, AuthzResult, PermissionQuery, PermissionQueryResult, Scope, ScopePermissions,
    WILDCARD_PERMISSION, WILDCARD_SCOPE_ID,
};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::cache::AuthzCache;
use crate::session::UserIdentity;
use crate::transport::AuthorizationTransport;

/// Reactive store of the permissions effective for the active scope.
///
/// Membership checks are synchronous; only loads touch the network (via
/// the cache). Any load failure results in an empty permission set so the
/// UI fails closed.
pub struct PermissionStore<T> {
    cache: Arc<AuthzCache<T>>,
    effective: watch::Sender<HashSet<String>>,
    loading: AtomicBool,
    load_complete: broadcast::Sender<()>,
    generation: AtomicU64,
}

impl<T> PermissionStore<T>
where
    T: AuthorizationTransport,
{
    /// Creates an empty store over the given cache.
    pub fn new(cache: Arc<AuthzCache<T>>) -> Self {
        let (effective, _) = watch::channel(HashSet::new());
        let (load_complete, _) = broadcast::channel(8);
        Self {
            cache,
            effective,
            loading: AtomicBool::new(false),
            load_complete,
            generation: AtomicU64::new(0),
        }
    }

    /// Loads and publishes the effective permissions for `scope`.
    ///
    /// Issues a breakdown query with empty `permissions` ("all held") and
    /// the scope's id as the only requested id. The effective set is the
    /// union of the wildcard permissions and the bucket matching the
    /// scope id.
    ///
    /// # Errors
    ///
    /// Failures are surfaced to the caller after the store has been reset
    /// to the empty set; a 401 additionally clears the underlying cache.
    pub async fn load_for_scope(&self, scope: &Scope) -> AuthzResult<()> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.loading.store(true, Ordering::SeqCst);
        tracing::debug!(scope = %scope, "loading effective permissions");

        let query = PermissionQuery::breakdown_for(scope);
        let outcome = self.cache.query(&query).await;

        let (published, result) = match outcome {
            Ok(PermissionQueryResult::Breakdown {
                all_permissions,
                results,
                ..
            }) => (effective_union(scope, &all_permissions, &results), Ok(())),
            Ok(PermissionQueryResult::Summary { .. }) => {
                // The endpoint answered the wrong shape; deny everything.
                let err = AuthzError::Decode {
                    message: "expected a breakdown response for a permission load".to_string(),
                };
                (HashSet::new(), Err(err))
            }
            Err(err) => {
                if err.is_unauthorized() {
                    self.cache.clear();
                }
                (HashSet::new(), Err(err))
            }
        };

        // A superseded load must not overwrite a newer one's outcome. The
        // loading flag is cleared before publishing so consumers woken by
        // the publish observe a settled store.
        if self.is_current(generation) {
            self.loading.store(false, Ordering::SeqCst);
            self.effective.send_replace(published);
        }
        let _ = self.load_complete.send(());

        result
    }

    /// Empties the effective permissions immediately, with no network call.
    ///
    /// Any load still in flight is superseded and will not publish.
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.loading.store(false, Ordering::SeqCst);
        self.effective.send_replace(HashSet::new());
    }

    /// True iff the effective set contains `permission` or the wildcard.
    pub fn has_permission(&self, permission: &str) -> bool {
        let effective = self.effective.borrow();
        effective.contains(WILDCARD_PERMISSION) || effective.contains(permission)
    }

    /// True iff any of `permissions` is held. Empty input yields `false`.
    pub fn has_any_permission<'a, I>(&self, permissions: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        permissions.into_iter().any(|p| self.has_permission(p))
    }

    /// True iff all of `permissions` are held. Empty input yields `true`.
    pub fn has_all_permissions<'a, I>(&self, permissions: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        permissions.into_iter().all(|p| self.has_permission(p))
    }

    /// Whether a load is currently in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Returns a snapshot of the effective permission set.
    pub fn effective(&self) -> HashSet<String> {
        self.effective.borrow().clone()
    }

    /// Subscribes to changes of the effective permission set.
    pub fn subscribe(&self) -> watch::Receiver<HashSet<String>> {
        self.effective.subscribe()
    }

    /// Waits for the in-flight load, if any, to complete.
    ///
    /// Resolves immediately when not loading. Otherwise subscribes to the
    /// completion event *before* re-checking the flag, so a completion
    /// firing between the check and the subscription cannot be missed.
    pub async fn wait_for_load(&self) {
        if !self.is_loading() {
            return;
        }
        let mut completions = self.load_complete.subscribe();
        if !self.is_loading() {
            return;
        }
        // A lagged receiver still proves a completion happened.
        let _ = completions.recv().await;
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Spawns the task that keeps the store synchronized with the session
    /// and the active scope.
    ///
    /// Level-triggered: a user transition to "none" clears immediately
    /// with no network call; a transition to "some" loads for the current
    /// scope; a scope-key change with a user present reloads. Scope
    /// changes with no authenticated user are ignored.
    pub fn spawn_reactor(
        self: &Arc<Self>,
        mut user_rx: watch::Receiver<Option<UserIdentity>>,
        mut scope_rx: watch::Receiver<Scope>,
    ) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = user_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let user = user_rx.borrow_and_update().clone();
                        match user {
                            None => store.clear(),
                            Some(_) => {
                                let scope = *scope_rx.borrow_and_update();
                                if let Err(err) = store.load_for_scope(&scope).await {
                                    tracing::warn!(%err, "permission load failed");
                                }
                            }
                        }
                    }
                    changed = scope_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let scope = *scope_rx.borrow_and_update();
                        if user_rx.borrow().is_some() {
                            if let Err(err) = store.load_for_scope(&scope).await {
                                tracing::warn!(%err, "permission load failed");
                            }
                        }
                    }
                }
            }
        })
    }
}

/// Union of the wildcard permissions and the bucket matching the scope id.
///
/// The wildcard contribution is `all_permissions` plus the
/// [`WILDCARD_SCOPE_ID`] bucket; for a `Global` scope only the wildcard
/// contribution applies.
fn effective_union(
    scope: &Scope,
    all_permissions: &[String],
    results: &[ScopePermissions],
) -> HashSet<String> {
    let mut effective: HashSet<String> = all_permissions.iter().cloned().collect();
    for bucket in results {
        let applies =
            bucket.scope_id == WILDCARD_SCOPE_ID || scope.id() == Some(bucket.scope_id);
        if applies {
            effective.extend(bucket.permissions.iter().cloned());
        }
    }
    effective
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(scope_id: i64, permissions: &[&str]) -> ScopePermissions {
        ScopePermissions {
            scope_id,
            permissions: permissions.iter().map(|p| (*p).to_string()).collect(),
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn union_dedupes_overlapping_wildcard_and_scope_permissions() {
        let effective = effective_union(
            &Scope::association(42),
            &strings(&["a"]),
            &[bucket(42, &["a", "b"])],
        );

        let expected: HashSet<String> = strings(&["a", "b"]).into_iter().collect();
        assert_eq!(effective, expected);
    }

    #[test]
    fn buckets_for_other_scope_ids_are_ignored() {
        let effective = effective_union(
            &Scope::association(42),
            &[],
            &[bucket(42, &["mine"]), bucket(43, &["theirs"])],
        );

        assert!(effective.contains("mine"));
        assert!(!effective.contains("theirs"));
    }

    #[test]
    fn the_wildcard_bucket_applies_to_every_scope() {
        let effective = effective_union(
            &Scope::game(7),
            &[],
            &[bucket(WILDCARD_SCOPE_ID, &["wild"]), bucket(7, &["local"])],
        );

        assert!(effective.contains("wild"));
        assert!(effective.contains("local"));
    }

    #[test]
    fn a_global_scope_takes_only_the_wildcard_contribution() {
        let effective = effective_union(
            &Scope::global(),
            &strings(&["root"]),
            &[bucket(WILDCARD_SCOPE_ID, &["wild"]), bucket(5, &["assoc"])],
        );

        assert!(effective.contains("root"));
        assert!(effective.contains("wild"));
        assert!(!effective.contains("assoc"));
    }
}
