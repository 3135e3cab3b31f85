//! Administrative scope types.
//!
//! Permissions are always evaluated against a scope: the whole portal
//! (`Global`), one association, or one game. A scope is identified by its
//! type plus an optional numeric id; `Global` never carries an id.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The level of the scope hierarchy a permission applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScopeType {
    /// The portal as a whole.
    Global,
    /// A single association.
    Association,
    /// A single game.
    Game,
}

impl ScopeType {
    /// Returns the lowercase name used in scope keys and routes.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeType::Global => "global",
            ScopeType::Association => "association",
            ScopeType::Game => "game",
        }
    }
}

impl fmt::Display for ScopeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The active administrative context.
///
/// Fields are private so the `Global ⇒ no id` invariant holds by
/// construction; use [`Scope::global`], [`Scope::association`] or
/// [`Scope::game`].
///
/// Two scopes are equal iff their [keys](Scope::key) are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scope {
    scope_type: ScopeType,
    id: Option<i64>,
}

impl Scope {
    /// The portal-wide scope.
    pub fn global() -> Self {
        Self {
            scope_type: ScopeType::Global,
            id: None,
        }
    }

    /// The scope of a single association.
    pub fn association(id: i64) -> Self {
        Self {
            scope_type: ScopeType::Association,
            id: Some(id),
        }
    }

    /// The scope of a single game.
    pub fn game(id: i64) -> Self {
        Self {
            scope_type: ScopeType::Game,
            id: Some(id),
        }
    }

    /// Returns the scope's type.
    pub fn scope_type(&self) -> ScopeType {
        self.scope_type
    }

    /// Returns the scope's id, if any. Always `None` for `Global`.
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    /// Returns the deterministic string key for this scope.
    ///
    /// The key is used for cache partitioning and change detection:
    /// `"global"`, `"association:42"`, `"game:7"`.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::global()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "{}:{id}", self.scope_type),
            None => write!(f, "{}", self.scope_type),
        }
    }
}
