//! RemoveEntity (0x0E): Server → Client.
//!
//! Despawns an entity from the client's world.

/// Remove an entity from the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveEntity {
    /// Unique entity ID to remove.
    pub entity_unique_id: i64,
}
