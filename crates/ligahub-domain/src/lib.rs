//! ligahub-domain: Scope and permission data model
//!
//! This crate contains the pure data model shared by the portal's
//! authorization client:
//! - The administrative scope hierarchy (Global → Association → Game)
//! - The permission query contract spoken with the remote endpoint
//! - The error taxonomy at the transport boundary
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               ligahub-domain                 │
//! ├─────────────────────────────────────────────┤
//! │  scope       - Scope types & scope keys     │
//! │  permission  - Query/result wire contract   │
//! │  error       - Transport error taxonomy     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! No I/O happens here; the working pieces live in `ligahub-authz`.

pub mod error;
pub mod permission;
pub mod scope;

// Re-export commonly used types at the crate root
pub use error::{AuthzError, AuthzResult};
pub use permission::{
    PermissionQuery, PermissionQueryResult, QueryKey, ScopePermissions, WILDCARD_PERMISSION,
    WILDCARD_SCOPE_ID,
};
pub use scope::{Scope, ScopeType};
