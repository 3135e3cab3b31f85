//! Authenticated-user signal.

use tokio::sync::watch;

/// Identity of the logged-in portal user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: i64,
    pub name: String,
}

impl UserIdentity {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Holds the current authenticated user and notifies subscribers on
/// login/logout transitions.
///
/// Subscribers react to the current value (level-triggered); setting the
/// same user again does not notify.
pub struct SessionContext {
    user: watch::Sender<Option<UserIdentity>>,
}

impl SessionContext {
    /// Creates a context with no authenticated user.
    pub fn new() -> Self {
        let (user, _) = watch::channel(None);
        Self { user }
    }

    /// Marks `user` as the authenticated user.
    pub fn login(&self, user: UserIdentity) {
        self.user.send_if_modified(|current| {
            if current.as_ref() == Some(&user) {
                false
            } else {
                *current = Some(user);
                true
            }
        });
    }

    /// Clears the authenticated user.
    pub fn logout(&self) {
        self.user.send_if_modified(|current| current.take().is_some());
    }

    /// Returns the current user, if any.
    pub fn current(&self) -> Option<UserIdentity> {
        self.user.borrow().clone()
    }

    /// Whether a user is currently authenticated.
    pub fn is_authenticated(&self) -> bool {
        self.user.borrow().is_some()
    }

    /// Subscribes to user transitions.
    pub fn subscribe(&self) -> watch::Receiver<Option<UserIdentity>> {
        self.user.subscribe()
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}
