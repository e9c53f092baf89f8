//! Name- and handle-indexed set of live sessions.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::session::PlayerSession;
use crate::transport::SessionHandle;

/// Result of [`PlayerRegistry::register_with`].
pub enum Registration {
    /// The session was inserted and is now reachable by name and handle.
    Registered(Arc<PlayerSession>),
    /// Another live session already uses this login name.
    NameTaken,
    /// The transport handle already belongs to a live session.
    HandleInUse,
    /// The registry is at its player limit.
    Full,
}

#[derive(Default)]
struct Entries {
    by_name: HashMap<String, Arc<PlayerSession>>,
    by_handle: HashMap<SessionHandle, Arc<PlayerSession>>,
}

/// Every name maps to at most one session and vice versa. All mutation goes
/// through one write lock so check-then-insert is atomic.
#[derive(Default)]
pub struct PlayerRegistry {
    entries: RwLock<Entries>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `session` unless its name or handle is already bound.
    pub fn add_player(&self, session: Arc<PlayerSession>) -> bool {
        let name = session.name().to_string();
        let handle = session.handle();
        matches!(
            self.register_with(&name, handle, usize::MAX, move || session),
            Registration::Registered(_)
        )
    }

    /// Checks name, handle and capacity, then builds and inserts the session,
    /// all inside one critical section. `build` runs only on success.
    pub fn register_with<F>(
        &self,
        name: &str,
        handle: SessionHandle,
        max_players: usize,
        build: F,
    ) -> Registration
    where
        F: FnOnce() -> Arc<PlayerSession>,
    {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.by_name.contains_key(name) {
            return Registration::NameTaken;
        }
        if entries.by_handle.contains_key(&handle) {
            return Registration::HandleInUse;
        }
        if entries.by_name.len() >= max_players {
            return Registration::Full;
        }
        let session = build();
        entries
            .by_name
            .insert(name.to_string(), Arc::clone(&session));
        entries.by_handle.insert(handle, Arc::clone(&session));
        Registration::Registered(session)
    }

    pub fn get_player_by_name(&self, name: &str) -> Option<Arc<PlayerSession>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.by_name.get(name).cloned()
    }

    pub fn get_player_by_handle(&self, handle: SessionHandle) -> Option<Arc<PlayerSession>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.by_handle.get(&handle).cloned()
    }

    /// Unbinds the name without any teardown. Returns the removed session.
    pub fn remove_player(&self, name: &str) -> Option<Arc<PlayerSession>> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let session = entries.by_name.remove(name)?;
        entries.by_handle.remove(&session.handle());
        Some(session)
    }

    /// Runs `teardown` with the write lock held, passing every *other* live
    /// session, then unbinds `session` if it is still the registered entry
    /// for its name. No login or lookup can interleave with the teardown.
    pub fn remove_session_with<R>(
        &self,
        session: &Arc<PlayerSession>,
        teardown: impl FnOnce(&[Arc<PlayerSession>]) -> R,
    ) -> R {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let peers: Vec<Arc<PlayerSession>> = entries
            .by_name
            .values()
            .filter(|other| !Arc::ptr_eq(other, session))
            .cloned()
            .collect();
        let result = teardown(&peers);
        let bound = entries
            .by_name
            .get(session.name())
            .is_some_and(|current| Arc::ptr_eq(current, session));
        if bound {
            entries.by_name.remove(session.name());
            entries.by_handle.remove(&session.handle());
        }
        result
    }

    /// Snapshot of every live session.
    pub fn players(&self) -> Vec<Arc<PlayerSession>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.by_name.values().cloned().collect()
    }

    pub fn names(&self) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = entries.by_name.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
