//! RequestChunkRadius (0x45): Client → Server.

/// The client requests a specific chunk render distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestChunkRadius {
    pub chunk_radius: i32,
    pub max_chunk_radius: i32,
}
