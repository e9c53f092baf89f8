//! Permission groups and per-session permission resolution.
//!
//! Groups are built once from configuration and shared between sessions;
//! each session layers its own explicit overrides on top of its group.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::config::PermissionsSection;

/// An explicit grant or denial of a named permission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    name: String,
    granted: bool,
}

impl Permission {
    /// A granting override.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            granted: true,
        }
    }

    /// A denying override.
    pub fn denied(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            granted: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_granted(&self) -> bool {
        self.granted
    }
}

/// A named, shareable bundle of permission grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    name: String,
    grants: HashSet<String>,
}

impl Group {
    pub fn new<I, S>(name: impl Into<String>, grants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            grants: grants.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_permission(&self, name: &str) -> bool {
        self.grants.contains(name)
    }

    /// Copies every grant of `parent` into this group.
    pub fn inherit(&mut self, parent: &Group) {
        self.grants.extend(parent.grants.iter().cloned());
    }
}

/// Pre-built groups plus the group new sessions start in.
#[derive(Debug)]
pub struct PermissionManager {
    groups: HashMap<String, Arc<Group>>,
    default_group: Arc<Group>,
}

impl PermissionManager {
    /// A manager with a single, empty default group.
    pub fn new(default_group: impl Into<String>) -> Self {
        let group = Arc::new(Group::new(default_group, Vec::<String>::new()));
        let mut groups = HashMap::new();
        groups.insert(group.name().to_string(), Arc::clone(&group));
        Self {
            groups,
            default_group: group,
        }
    }

    /// Builds groups from the `[permissions]` config section, resolving `inherits` chains.
    pub fn from_config(section: &PermissionsSection) -> Self {
        let definitions: HashMap<&str, _> = section
            .groups
            .iter()
            .map(|g| (g.name.as_str(), g))
            .collect();

        let mut groups = HashMap::new();
        for def in &section.groups {
            let mut group = Group::new(def.name.clone(), def.permissions.iter().cloned());
            let mut seen = HashSet::from([def.name.as_str()]);
            let mut parent = def.inherits.as_deref();
            while let Some(parent_name) = parent {
                if !seen.insert(parent_name) {
                    warn!("Permission group {} has an inheritance cycle", def.name);
                    break;
                }
                match definitions.get(parent_name) {
                    Some(parent_def) => {
                        let parent_group =
                            Group::new(parent_name, parent_def.permissions.iter().cloned());
                        group.inherit(&parent_group);
                        parent = parent_def.inherits.as_deref();
                    }
                    None => {
                        warn!(
                            "Permission group {} inherits unknown group {parent_name}",
                            def.name
                        );
                        break;
                    }
                }
            }
            groups.insert(def.name.clone(), Arc::new(group));
        }

        let default_group = match groups.get(&section.default_group) {
            Some(group) => Arc::clone(group),
            None => {
                debug!(
                    "Default permission group {} not defined, using an empty group",
                    section.default_group
                );
                let group = Arc::new(Group::new(
                    section.default_group.clone(),
                    Vec::<String>::new(),
                ));
                groups.insert(section.default_group.clone(), Arc::clone(&group));
                group
            }
        };

        Self {
            groups,
            default_group,
        }
    }

    /// Adds or replaces a group.
    pub fn add_group(&mut self, group: Group) -> Arc<Group> {
        let group = Arc::new(group);
        if group.name() == self.default_group.name() {
            self.default_group = Arc::clone(&group);
        }
        self.groups.insert(group.name().to_string(), Arc::clone(&group));
        group
    }

    pub fn default_group(&self) -> Arc<Group> {
        Arc::clone(&self.default_group)
    }

    pub fn group(&self, name: &str) -> Option<Arc<Group>> {
        self.groups.get(name).cloned()
    }
}

struct PermissionState {
    group: Arc<Group>,
    overrides: HashMap<String, Permission>,
}

/// A session's group reference plus its explicit overrides.
pub struct PermissionSet {
    state: RwLock<PermissionState>,
}

impl PermissionSet {
    pub fn new(group: Arc<Group>) -> Self {
        Self {
            state: RwLock::new(PermissionState {
                group,
                overrides: HashMap::new(),
            }),
        }
    }

    pub fn group(&self) -> Arc<Group> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&state.group)
    }

    pub fn set_group(&self, group: Arc<Group>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.group = group;
    }

    /// Granted by the group, or by an explicit granting override.
    pub fn has_permission(&self, name: &str) -> bool {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Self::resolve(&state, name)
    }

    /// Inserts or replaces the override. Returns whether an explicit override
    /// with the same name was replaced; group grants do not count.
    pub fn add_permission(&self, permission: Permission) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state
            .overrides
            .insert(permission.name.clone(), permission)
            .is_some()
    }

    /// Deletes the explicit override. A no-op returning `false` when there is
    /// no override or the permission does not currently resolve to granted.
    /// The group's own grant is never touched.
    pub fn remove_permission(&self, name: &str) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !state.overrides.contains_key(name) || !Self::resolve(&state, name) {
            return false;
        }
        state.overrides.remove(name);
        true
    }

    /// The explicit override for `name`, if any.
    pub fn override_for(&self, name: &str) -> Option<Permission> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.overrides.get(name).cloned()
    }

    fn resolve(state: &PermissionState, name: &str) -> bool {
        state.group.has_permission(name)
            || state
                .overrides
                .get(name)
                .is_some_and(Permission::is_granted)
    }
}
