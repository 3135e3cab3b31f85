//! ligahub-authz: client-side authorization resolution and caching
//!
//! Determines which permissions the current user effectively holds for the
//! active administrative scope, fetches that information from the remote
//! endpoint as infrequently as possible, and keeps reactive consumers
//! (menus, guards, buttons) synchronized as the user navigates between
//! scopes and logs in or out.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                    ligahub-authz                      │
//! ├──────────────────────────────────────────────────────┤
//! │  transport     - reqwest HTTP transport (trait seam) │
//! │  gateway       - query normalization + dispatch      │
//! │  cache         - TTL cache + singleflight dedup      │
//! │  session       - authenticated-user signal           │
//! │  scope_context - active-scope signal                 │
//! │  store         - effective-permission store          │
//! │  planner       - navigation action planner           │
//! │  config        - file/env configuration              │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Data flow: route/user/scope changes → cache (via gateway) → permission
//! store → navigation planner → UI. A 401 from the transport feeds back
//! into the cache as a full invalidation.
//!
//! # Wiring
//!
//! Components are ordinary owned objects, wired together once at
//! application start:
//!
//! ```rust,ignore
//! let config = AuthzConfig::from_env()?;
//! let transport = Arc::new(HttpTransport::new(&config.api)?);
//! let gateway = AuthorizationGateway::new(transport);
//! let cache = Arc::new(AuthzCache::new(gateway, config.cache.settings()));
//! let store = Arc::new(PermissionStore::new(cache));
//! let session = SessionContext::new();
//! let scope = ScopeContext::new();
//! store.spawn_reactor(session.subscribe(), scope.subscribe());
//! ```

pub mod cache;
pub mod config;
pub mod gateway;
pub mod planner;
pub mod scope_context;
pub mod session;
pub mod store;
pub mod transport;

// Re-export commonly used types at the crate root
pub use cache::{register_authz_cache_metrics, AuthzCache, CacheSettings};
pub use config::{ApiSettings, AuthzConfig, CacheConfig};
pub use gateway::AuthorizationGateway;
pub use planner::{plan, AdminAction, NavigationActionPlanner, OwnedEntity, PlannerInput, RouteData};
pub use scope_context::ScopeContext;
pub use session::{SessionContext, UserIdentity};
pub use store::PermissionStore;
pub use transport::{AuthorizationTransport, HttpTransport};
