//! Navigation affordances derived from user, permissions, scope and route.
//!
//! The planner turns the current authorization state into a small list of
//! admin entry points: an "edit this page" link when the route carries an
//! editable entity, and the administration entry point when the user holds
//! any permission for the active scope. Actions are recomputed, never
//! mutated in place.

use std::collections::HashSet;
use std::sync::Arc;

use ligahub_domain::{Scope, ScopeType, WILDCARD_PERMISSION};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::session::UserIdentity;
use crate::store::PermissionStore;
use crate::transport::AuthorizationTransport;

/// Permission required to edit a page entity.
pub const PAGES_EDIT_PERMISSION: &str = "pages.edit";

/// First segment of every administration route.
const ADMIN_ROUTE_ROOT: &str = "admin";

/// A navigation affordance shown to administrators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminAction {
    pub label: String,
    pub route: Vec<String>,
    pub is_visible: bool,
}

/// An ownable entity carried by the current route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnedEntity {
    pub id: i64,
    pub owner_type: ScopeType,
    pub owner_id: i64,
}

/// Data attached to the current route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteData {
    /// The entity the route points at, if any.
    pub entity: Option<OwnedEntity>,
}

/// Snapshot of the planner's inputs.
#[derive(Debug, Clone)]
pub struct PlannerInput {
    pub user: Option<UserIdentity>,
    pub permissions: HashSet<String>,
    pub is_loading: bool,
    pub scope: Scope,
    pub route: RouteData,
}

/// Computes the action list for an input snapshot.
///
/// Returns `None` while permissions are still loading for an
/// authenticated user — the previous output stays valid until the store
/// settles. Without a user the result is immediately the empty list.
pub fn plan(input: &PlannerInput) -> Option<Vec<AdminAction>> {
    if input.user.is_none() {
        return Some(Vec::new());
    }
    if input.is_loading {
        return None;
    }

    let mut actions = Vec::new();

    if let Some(entity) = input.route.entity {
        if holds(&input.permissions, PAGES_EDIT_PERMISSION) {
            actions.push(AdminAction {
                label: "Edit page".to_string(),
                route: vec![
                    ADMIN_ROUTE_ROOT.to_string(),
                    entity.owner_type.as_str().to_string(),
                    entity.owner_id.to_string(),
                    "pages".to_string(),
                    entity.id.to_string(),
                ],
                is_visible: true,
            });
        }
    }

    if !input.permissions.is_empty() {
        let label = match input.scope.scope_type() {
            ScopeType::Global => "Administration",
            ScopeType::Association => "Association administration",
            ScopeType::Game => "Game administration",
        };
        actions.push(AdminAction {
            label: label.to_string(),
            route: vec![ADMIN_ROUTE_ROOT.to_string()],
            is_visible: true,
        });
    }

    Some(actions)
}

fn holds(permissions: &HashSet<String>, permission: &str) -> bool {
    permissions.contains(WILDCARD_PERMISSION) || permissions.contains(permission)
}

/// Recomputes admin actions whenever user, permissions, scope or route
/// change.
pub struct NavigationActionPlanner<T> {
    store: Arc<PermissionStore<T>>,
}

impl<T> NavigationActionPlanner<T>
where
    T: AuthorizationTransport,
{
    pub fn new(store: Arc<PermissionStore<T>>) -> Self {
        Self { store }
    }

    /// Spawns the recomputation task.
    ///
    /// Returns the output channel and the task handle. The output starts
    /// as the empty list and is only replaced by settled results; while a
    /// load is in flight the previous output is kept, except that a
    /// logout empties it immediately.
    pub fn spawn(
        &self,
        mut user_rx: watch::Receiver<Option<UserIdentity>>,
        mut scope_rx: watch::Receiver<Scope>,
        mut route_rx: watch::Receiver<RouteData>,
    ) -> (watch::Receiver<Vec<AdminAction>>, JoinHandle<()>) {
        let (actions_tx, actions_rx) = watch::channel(Vec::new());
        let store = Arc::clone(&self.store);
        let mut permissions_rx = store.subscribe();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = user_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    changed = permissions_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    changed = scope_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    changed = route_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }

                let input = PlannerInput {
                    user: user_rx.borrow_and_update().clone(),
                    permissions: permissions_rx.borrow_and_update().clone(),
                    is_loading: store.is_loading(),
                    scope: *scope_rx.borrow_and_update(),
                    route: route_rx.borrow_and_update().clone(),
                };

                if let Some(actions) = plan(&input) {
                    actions_tx.send_if_modified(|current| {
                        if *current == actions {
                            false
                        } else {
                            *current = actions;
                            true
                        }
                    });
                }
            }
        });

        (actions_rx, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn permissions(values: &[&str]) -> HashSet<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    fn input(user: bool, perms: &[&str]) -> PlannerInput {
        PlannerInput {
            user: user.then(|| UserIdentity::new(1, "ada")),
            permissions: permissions(perms),
            is_loading: false,
            scope: Scope::global(),
            route: RouteData::default(),
        }
    }

    #[test]
    fn no_user_yields_an_empty_action_list_immediately() {
        let actions = plan(&input(false, &["admin"])).unwrap();

        assert!(actions.is_empty());
    }

    #[test]
    fn loading_with_a_user_defers() {
        let mut snapshot = input(true, &["admin"]);
        snapshot.is_loading = true;

        assert_eq!(plan(&snapshot), None);
    }

    #[test]
    fn an_empty_permission_set_yields_no_actions() {
        let actions = plan(&input(true, &[])).unwrap();

        assert!(actions.is_empty());
    }

    #[test]
    fn the_admin_entry_point_label_depends_on_the_scope_type() {
        for (scope, label) in [
            (Scope::global(), "Administration"),
            (Scope::association(42), "Association administration"),
            (Scope::game(7), "Game administration"),
        ] {
            let mut snapshot = input(true, &["members.read"]);
            snapshot.scope = scope;

            let actions = plan(&snapshot).unwrap();

            assert_eq!(actions.len(), 1);
            assert_eq!(actions[0].label, label);
            // The route is scope-independent.
            assert_eq!(actions[0].route, vec!["admin".to_string()]);
            assert!(actions[0].is_visible);
        }
    }

    #[test]
    fn a_route_entity_with_the_edit_permission_adds_an_edit_action() {
        let mut snapshot = input(true, &[PAGES_EDIT_PERMISSION]);
        snapshot.route.entity = Some(OwnedEntity {
            id: 314,
            owner_type: ScopeType::Association,
            owner_id: 42,
        });

        let actions = plan(&snapshot).unwrap();

        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].label, "Edit page");
        assert_eq!(
            actions[0].route,
            vec!["admin", "association", "42", "pages", "314"]
        );
    }

    #[test]
    fn a_route_entity_without_the_edit_permission_adds_no_edit_action() {
        let mut snapshot = input(true, &["members.read"]);
        snapshot.route.entity = Some(OwnedEntity {
            id: 314,
            owner_type: ScopeType::Game,
            owner_id: 7,
        });

        let actions = plan(&snapshot).unwrap();

        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].label, "Game administration");
    }

    #[test]
    fn the_wildcard_grants_the_edit_permission() {
        let mut snapshot = input(true, &[WILDCARD_PERMISSION]);
        snapshot.route.entity = Some(OwnedEntity {
            id: 1,
            owner_type: ScopeType::Global,
            owner_id: 0,
        });

        let actions = plan(&snapshot).unwrap();

        assert_eq!(actions[0].label, "Edit page");
    }
}
