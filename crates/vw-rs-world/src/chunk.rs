//! Chunk addressing and the chunk/provider seams.

use std::fmt;
use std::sync::Arc;

use vw_rs_proto::types::ChunkPos;

/// log2 of the chunk edge length.
pub const CHUNK_SHIFT: u32 = 4;

/// Chunk edge length in blocks.
pub const CHUNK_SIZE: i32 = 1 << CHUNK_SHIFT;

/// Chunk coordinate containing the given block-space coordinate.
///
/// Floors first so that `-0.5` lands in chunk `-1`, then shifts arithmetically.
pub fn chunk_coord(v: f32) -> i32 {
    (v.floor() as i32) >> CHUNK_SHIFT
}

/// Packs a chunk coordinate pair into a single map key.
pub fn chunk_index(x: i32, z: i32) -> i64 {
    ((x as i64) << 32) | (z as u32 as i64)
}

/// Identifies a session subscribed to a chunk (its entity runtime id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewerId(pub u64);

impl fmt::Display for ViewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "viewer#{}", self.0)
    }
}

/// An entity registered in a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub unique_id: i64,
    pub runtime_id: u64,
}

impl EntityRef {
    pub fn new(unique_id: i64, runtime_id: u64) -> Self {
        Self {
            unique_id,
            runtime_id,
        }
    }
}

/// A chunk column owned by the world. Sessions only hold subscriptions.
pub trait Chunk: Send + Sync {
    fn x(&self) -> i32;

    fn z(&self) -> i32;

    fn pos(&self) -> ChunkPos {
        ChunkPos::new(self.x(), self.z())
    }

    fn index(&self) -> i64 {
        chunk_index(self.x(), self.z())
    }

    fn add_viewer(&self, viewer: ViewerId);

    fn remove_viewer(&self, viewer: ViewerId);

    fn viewers(&self) -> Vec<ViewerId>;

    /// Snapshot of the entities currently in this chunk.
    fn entities(&self) -> Vec<EntityRef>;
}

pub type ChunkRef = Arc<dyn Chunk>;

/// Supplies chunk references on demand.
pub trait ChunkProvider: Send + Sync {
    /// Returns `None` when the chunk is not available (outside the world, not yet generated).
    fn chunk(&self, x: i32, z: i32) -> Option<ChunkRef>;
}
