//! Active-scope signal.

use ligahub_domain::Scope;
use tokio::sync::watch;

/// Holds the currently active administrative scope.
///
/// Subscribers are notified only when the scope *key* changes; re-setting
/// an equivalent scope is a no-op. Starts at [`Scope::global`].
pub struct ScopeContext {
    scope: watch::Sender<Scope>,
}

impl ScopeContext {
    pub fn new() -> Self {
        let (scope, _) = watch::channel(Scope::global());
        Self { scope }
    }

    /// Activates `scope`, notifying subscribers if the key changed.
    pub fn set(&self, scope: Scope) {
        self.scope.send_if_modified(|current| {
            if current.key() == scope.key() {
                false
            } else {
                *current = scope;
                true
            }
        });
    }

    /// Returns the currently active scope.
    pub fn current(&self) -> Scope {
        *self.scope.borrow()
    }

    /// Subscribes to scope changes.
    pub fn subscribe(&self) -> watch::Receiver<Scope> {
        self.scope.subscribe()
    }
}

impl Default for ScopeContext {
    fn default() -> Self {
        Self::new()
    }
}
