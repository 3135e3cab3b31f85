//! Permission query contract for the remote authorization endpoint.
//!
//! A [`PermissionQuery`] asks which scopes of a given type satisfy a set of
//! permissions. The endpoint answers in one of two shapes, distinguished
//! purely by which fields are present:
//!
//! - **Summary**: which scope ids satisfy *all* requested permissions.
//! - **Breakdown**: per-scope-id detail, plus the permissions that hold for
//!   every scope of the type.
//!
//! # Wire conventions
//!
//! - An empty `permissions` list means "return all held permissions",
//!   not "return none". It must be transmitted as an empty array.
//! - The breakdown bucket with scope id [`WILDCARD_SCOPE_ID`] carries
//!   permissions that apply to every scope of the type. The sentinel value
//!   is a protocol contract with the server and must not be changed.

use serde::{Deserialize, Serialize};

use crate::scope::{Scope, ScopeType};

/// Scope id of the wildcard bucket in breakdown results.
///
/// Protocol contract: the server uses id `0` for permissions that apply to
/// all scopes of the queried type.
pub const WILDCARD_SCOPE_ID: i64 = 0;

/// Permission token that matches any permission.
///
/// `"*"` is a universal-match sentinel in an effective permission set, not
/// a literal permission string.
pub const WILDCARD_PERMISSION: &str = "*";

/// A query against the remote permission endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionQuery {
    /// The scope type the query is evaluated against.
    pub scope_type: ScopeType,
    /// Scope ids to evaluate. Empty means "all scopes visible to the user".
    #[serde(default)]
    pub scope_ids: Vec<i64>,
    /// Permissions to check. Empty means "return all held permissions".
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Whether to request per-scope-id detail instead of a summary.
    #[serde(default)]
    pub breakdown: bool,
}

impl PermissionQuery {
    /// Creates a summary query for the given scope type.
    pub fn new(scope_type: ScopeType) -> Self {
        Self {
            scope_type,
            scope_ids: Vec::new(),
            permissions: Vec::new(),
            breakdown: false,
        }
    }

    /// Creates the breakdown query that loads every permission the user
    /// holds for `scope`: empty `permissions`, and the scope's id as the
    /// only requested id (none for `Global`).
    pub fn breakdown_for(scope: &Scope) -> Self {
        Self {
            scope_type: scope.scope_type(),
            scope_ids: scope.id().into_iter().collect(),
            permissions: Vec::new(),
            breakdown: true,
        }
    }

    /// Sets the scope ids to evaluate.
    pub fn with_scope_ids(mut self, scope_ids: Vec<i64>) -> Self {
        self.scope_ids = scope_ids;
        self
    }

    /// Sets the permissions to check.
    pub fn with_permissions(mut self, permissions: Vec<String>) -> Self {
        self.permissions = permissions;
        self
    }

    /// Requests per-scope-id detail.
    pub fn with_breakdown(mut self, breakdown: bool) -> Self {
        self.breakdown = breakdown;
        self
    }

    /// Returns a normalized copy of this query, leaving `self` untouched.
    ///
    /// Scope ids are sorted ascending and deduplicated, permissions are
    /// sorted lexicographically and deduplicated. Two queries requesting
    /// the same logical information normalize to the same value.
    pub fn normalized(&self) -> Self {
        let mut scope_ids = self.scope_ids.clone();
        scope_ids.sort_unstable();
        scope_ids.dedup();

        let mut permissions = self.permissions.clone();
        permissions.sort_unstable();
        permissions.dedup();

        Self {
            scope_type: self.scope_type,
            scope_ids,
            permissions,
            breakdown: self.breakdown,
        }
    }
}

/// Cache key derived from a normalized query.
///
/// Insensitive to the order of `scope_ids` and `permissions` in the query
/// it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    scope_type: ScopeType,
    breakdown: bool,
    scope_ids: Vec<i64>,
    permissions: Vec<String>,
}

impl QueryKey {
    /// Derives the cache key for `query`.
    pub fn of(query: &PermissionQuery) -> Self {
        let normalized = query.normalized();
        Self {
            scope_type: normalized.scope_type,
            breakdown: normalized.breakdown,
            scope_ids: normalized.scope_ids,
            permissions: normalized.permissions,
        }
    }
}

/// Per-scope-id permission bucket in a breakdown result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopePermissions {
    /// The scope id, or [`WILDCARD_SCOPE_ID`] for the wildcard bucket.
    pub scope_id: i64,
    /// Permissions held for that scope.
    pub permissions: Vec<String>,
}

/// Answer from the remote permission endpoint.
///
/// The two shapes carry no explicit type tag; presence of
/// `allPermissions` + `results` means breakdown, their absence summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PermissionQueryResult {
    /// Per-scope-id detail.
    #[serde(rename_all = "camelCase")]
    Breakdown {
        /// The scope type the query was evaluated against.
        scope_type: ScopeType,
        /// Whether every evaluated scope satisfied the query.
        all: bool,
        /// Permissions held for every scope of the type.
        all_permissions: Vec<String>,
        /// Per-scope-id permission buckets.
        results: Vec<ScopePermissions>,
    },
    /// Aggregated answer: which scope ids satisfy all requested permissions.
    #[serde(rename_all = "camelCase")]
    Summary {
        /// The scope type the query was evaluated against.
        scope_type: ScopeType,
        /// Whether every evaluated scope satisfied the query.
        all: bool,
        /// Scope ids that satisfy all requested permissions.
        scope_ids: Vec<i64>,
    },
}

impl PermissionQueryResult {
    /// Returns `true` for the breakdown shape.
    pub fn is_breakdown(&self) -> bool {
        matches!(self, PermissionQueryResult::Breakdown { .. })
    }
}
