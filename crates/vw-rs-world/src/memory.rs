//! In-memory chunk provider.
//!
//! Columns are created empty on first request and cached for the lifetime of
//! the world. Storage, generation and persistence belong to the embedding
//! server; this provider only tracks viewers and entities.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::debug;

use crate::chunk::{Chunk, ChunkProvider, ChunkRef, EntityRef, ViewerId};

/// A chunk column that records its viewers and entities.
pub struct MemoryChunk {
    x: i32,
    z: i32,
    viewers: Mutex<HashSet<ViewerId>>,
    entities: RwLock<Vec<EntityRef>>,
}

impl MemoryChunk {
    pub fn new(x: i32, z: i32) -> Self {
        Self {
            x,
            z,
            viewers: Mutex::new(HashSet::new()),
            entities: RwLock::new(Vec::new()),
        }
    }

    pub fn add_entity(&self, entity: EntityRef) {
        let mut entities = self.entities.write().unwrap_or_else(PoisonError::into_inner);
        if !entities.contains(&entity) {
            entities.push(entity);
        }
    }

    /// Returns `true` if the entity was present.
    pub fn remove_entity(&self, unique_id: i64) -> bool {
        let mut entities = self.entities.write().unwrap_or_else(PoisonError::into_inner);
        let before = entities.len();
        entities.retain(|e| e.unique_id != unique_id);
        entities.len() != before
    }

    pub fn has_viewer(&self, viewer: ViewerId) -> bool {
        self.viewers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&viewer)
    }
}

impl Chunk for MemoryChunk {
    fn x(&self) -> i32 {
        self.x
    }

    fn z(&self) -> i32 {
        self.z
    }

    fn add_viewer(&self, viewer: ViewerId) {
        self.viewers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(viewer);
    }

    fn remove_viewer(&self, viewer: ViewerId) {
        self.viewers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&viewer);
    }

    fn viewers(&self) -> Vec<ViewerId> {
        let mut viewers: Vec<ViewerId> = self
            .viewers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .copied()
            .collect();
        viewers.sort();
        viewers
    }

    fn entities(&self) -> Vec<EntityRef> {
        self.entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Lazily populated map of [`MemoryChunk`] columns.
#[derive(Default)]
pub struct MemoryWorld {
    chunks: Mutex<HashMap<(i32, i32), Arc<MemoryChunk>>>,
    /// Chunks farther than this (Chebyshev distance from origin) are not provided.
    border: Option<i32>,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// A world that refuses chunks outside `[-border, border]` on both axes.
    pub fn with_border(border: i32) -> Self {
        Self {
            chunks: Mutex::new(HashMap::new()),
            border: Some(border),
        }
    }

    /// Concrete handle to a column, creating it if needed.
    pub fn column(&self, x: i32, z: i32) -> Option<Arc<MemoryChunk>> {
        if let Some(border) = self.border {
            if x.abs() > border || z.abs() > border {
                return None;
            }
        }
        let mut chunks = self.chunks.lock().unwrap_or_else(PoisonError::into_inner);
        let chunk = chunks.entry((x, z)).or_insert_with(|| {
            debug!("Created chunk column ({x}, {z})");
            Arc::new(MemoryChunk::new(x, z))
        });
        Some(Arc::clone(chunk))
    }

    pub fn loaded_count(&self) -> usize {
        self.chunks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl ChunkProvider for MemoryWorld {
    fn chunk(&self, x: i32, z: i32) -> Option<ChunkRef> {
        self.column(x, z).map(|c| c as ChunkRef)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_is_cached() {
        let world = MemoryWorld::new();
        let a = world.column(1, 2).unwrap();
        let b = world.column(1, 2).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(world.loaded_count(), 1);
    }

    #[test]
    fn border_limits_provider() {
        let world = MemoryWorld::with_border(2);
        assert!(world.chunk(2, -2).is_some());
        assert!(world.chunk(3, 0).is_none());
        assert!(world.chunk(0, -3).is_none());
    }

    #[test]
    fn viewers_add_and_remove() {
        let chunk = MemoryChunk::new(0, 0);
        chunk.add_viewer(ViewerId(2));
        chunk.add_viewer(ViewerId(1));
        chunk.add_viewer(ViewerId(2));
        assert_eq!(chunk.viewers(), vec![ViewerId(1), ViewerId(2)]);
        chunk.remove_viewer(ViewerId(2));
        assert!(!chunk.has_viewer(ViewerId(2)));
        assert!(chunk.has_viewer(ViewerId(1)));
    }

    #[test]
    fn entities_dedup_and_remove() {
        let chunk = MemoryChunk::new(0, 0);
        chunk.add_entity(EntityRef::new(5, 5));
        chunk.add_entity(EntityRef::new(5, 5));
        chunk.add_entity(EntityRef::new(6, 6));
        assert_eq!(chunk.entities().len(), 2);
        assert!(chunk.remove_entity(5));
        assert!(!chunk.remove_entity(5));
        assert_eq!(chunk.entities(), vec![EntityRef::new(6, 6)]);
    }
}
