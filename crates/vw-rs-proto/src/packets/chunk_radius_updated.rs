//! ChunkRadiusUpdated (0x46): Server → Client.

/// The radius the server actually accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRadiusUpdated {
    pub chunk_radius: i32,
}
