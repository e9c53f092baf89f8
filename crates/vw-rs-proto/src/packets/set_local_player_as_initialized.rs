//! SetLocalPlayerAsInitialized (0x71): Client → Server.

/// The client has finished loading and its player can be spawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetLocalPlayerAsInitialized {
    pub entity_runtime_id: u64,
}
