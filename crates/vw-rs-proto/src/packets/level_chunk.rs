//! LevelChunk (0x3A): Server → Client.

use bytes::Bytes;

/// Full chunk column data. The payload is filled in by the codec from the
/// world's storage; the core only addresses the column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelChunk {
    pub chunk_x: i32,
    pub chunk_z: i32,
    pub dimension_id: i32,
    pub payload: Bytes,
}

impl LevelChunk {
    pub fn column(chunk_x: i32, chunk_z: i32) -> Self {
        Self {
            chunk_x,
            chunk_z,
            dimension_id: 0,
            payload: Bytes::new(),
        }
    }
}
