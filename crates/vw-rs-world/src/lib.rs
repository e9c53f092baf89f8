//! World-side collaborators of the server core: chunk addressing, the chunk
//! and provider traits, and an in-memory provider.

pub mod chunk;
pub mod memory;

pub use chunk::{
    chunk_coord, chunk_index, Chunk, ChunkProvider, ChunkRef, EntityRef, ViewerId, CHUNK_SHIFT,
    CHUNK_SIZE,
};
pub use memory::{MemoryChunk, MemoryWorld};
