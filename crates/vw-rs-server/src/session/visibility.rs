//! Chunk interest sets.
//!
//! A session tracks the chunks it is subscribed to in a [`TrackedChunks`]
//! store keyed by chunk index. A chunk at `c` is in range of a session anchored
//! at `a` with view distance `r` iff `|c - a|² <= r²` (planar, in chunks) and
//! `r > 0`. A view distance of zero tracks nothing, not even the anchor.

use std::collections::HashMap;

use vw_rs_proto::types::ChunkPos;
use vw_rs_world::ChunkRef;

/// Largest view distance a session can hold. Larger values are clamped.
pub const MAX_VIEW_DISTANCE: u32 = 64;

pub fn radius_squared(view_distance: u32) -> i64 {
    let r = i64::from(view_distance.min(MAX_VIEW_DISTANCE));
    r * r
}

pub fn in_range(anchor: ChunkPos, pos: ChunkPos, view_distance: u32) -> bool {
    view_distance > 0 && anchor.distance_squared(&pos) <= radius_squared(view_distance)
}

/// Every chunk within `view_distance` of `anchor`, nearest first.
pub fn chunks_in_range(anchor: ChunkPos, view_distance: u32) -> Vec<ChunkPos> {
    let r = view_distance.min(MAX_VIEW_DISTANCE) as i32;
    let mut positions: Vec<ChunkPos> = ((anchor.x - r)..=(anchor.x + r))
        .flat_map(|x| ((anchor.z - r)..=(anchor.z + r)).map(move |z| ChunkPos::new(x, z)))
        .filter(|pos| in_range(anchor, *pos, view_distance))
        .collect();
    positions.sort_by_key(|pos| (anchor.distance_squared(pos), pos.x, pos.z));
    positions
}

/// Chunks a session is currently subscribed to.
#[derive(Default)]
pub struct TrackedChunks {
    chunks: HashMap<i64, ChunkRef>,
}

impl TrackedChunks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn contains(&self, index: i64) -> bool {
        self.chunks.contains_key(&index)
    }

    /// Returns `false` if a chunk with the same index was already tracked.
    pub fn insert(&mut self, chunk: ChunkRef) -> bool {
        let index = chunk.index();
        if self.chunks.contains_key(&index) {
            return false;
        }
        self.chunks.insert(index, chunk);
        true
    }

    /// Removes and returns every chunk out of range of `anchor`.
    pub fn cull(&mut self, anchor: ChunkPos, view_distance: u32) -> Vec<ChunkRef> {
        let out_of_range: Vec<i64> = self
            .chunks
            .iter()
            .filter(|(_, chunk)| !in_range(anchor, chunk.pos(), view_distance))
            .map(|(index, _)| *index)
            .collect();
        out_of_range
            .into_iter()
            .filter_map(|index| self.chunks.remove(&index))
            .collect()
    }

    /// In-range chunks not yet tracked, nearest first.
    pub fn missing(&self, anchor: ChunkPos, view_distance: u32) -> Vec<ChunkPos> {
        chunks_in_range(anchor, view_distance)
            .into_iter()
            .filter(|pos| !self.contains(vw_rs_world::chunk_index(pos.x, pos.z)))
            .collect()
    }

    /// Removes and returns every tracked chunk.
    pub fn drain(&mut self) -> Vec<ChunkRef> {
        self.chunks.drain().map(|(_, chunk)| chunk).collect()
    }

    /// Tracked positions, sorted.
    pub fn positions(&self) -> Vec<ChunkPos> {
        let mut positions: Vec<ChunkPos> = self.chunks.values().map(|c| c.pos()).collect();
        positions.sort_by_key(|pos| (pos.x, pos.z));
        positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use vw_rs_world::MemoryChunk;

    fn chunk(x: i32, z: i32) -> ChunkRef {
        Arc::new(MemoryChunk::new(x, z))
    }

    fn track_all(tracked: &mut TrackedChunks, anchor: ChunkPos, view_distance: u32) {
        for pos in tracked.missing(anchor, view_distance) {
            tracked.insert(chunk(pos.x, pos.z));
        }
    }

    #[test]
    fn range_counts() {
        let origin = ChunkPos::new(0, 0);
        assert!(chunks_in_range(origin, 0).is_empty());
        assert_eq!(chunks_in_range(origin, 1).len(), 5);
        // 13 = centre + 4 axis neighbours at 1 + 4 diagonals + 4 axis at 2.
        assert_eq!(chunks_in_range(origin, 2).len(), 13);
        assert_eq!(chunks_in_range(origin, 3).len(), 29);
    }

    #[test]
    fn oversized_view_distance_is_clamped() {
        let origin = ChunkPos::new(0, 0);
        let capped = chunks_in_range(origin, MAX_VIEW_DISTANCE);
        assert_eq!(chunks_in_range(origin, u32::MAX), capped);
        assert!(!in_range(origin, ChunkPos::new(65, 0), u32::MAX));
        assert!(in_range(origin, ChunkPos::new(64, 0), u32::MAX));
    }

    #[test]
    fn range_is_nearest_first() {
        let anchor = ChunkPos::new(3, -2);
        let positions = chunks_in_range(anchor, 4);
        assert_eq!(positions[0], anchor);
        for pair in positions.windows(2) {
            assert!(anchor.distance_squared(&pair[0]) <= anchor.distance_squared(&pair[1]));
        }
    }

    #[test]
    fn insert_rejects_duplicate_index() {
        let mut tracked = TrackedChunks::new();
        assert!(tracked.insert(chunk(1, 1)));
        assert!(!tracked.insert(chunk(1, 1)));
        assert_eq!(tracked.len(), 1);
    }

    #[test]
    fn cull_drops_only_out_of_range() {
        let mut tracked = TrackedChunks::new();
        let origin = ChunkPos::new(0, 0);
        track_all(&mut tracked, origin, 2);
        assert_eq!(tracked.len(), 13);

        let dropped = tracked.cull(ChunkPos::new(1, 0), 2);
        let mut dropped_pos: Vec<ChunkPos> = dropped.iter().map(|c| c.pos()).collect();
        dropped_pos.sort_by_key(|p| (p.x, p.z));
        assert_eq!(
            dropped_pos,
            vec![
                ChunkPos::new(-2, 0),
                ChunkPos::new(-1, -1),
                ChunkPos::new(-1, 1),
                ChunkPos::new(0, -2),
                ChunkPos::new(0, 2),
            ]
        );
        for pos in tracked.positions() {
            assert!(in_range(ChunkPos::new(1, 0), pos, 2));
        }
    }

    #[test]
    fn far_move_drops_everything() {
        let mut tracked = TrackedChunks::new();
        track_all(&mut tracked, ChunkPos::new(0, 0), 2);
        let dropped = tracked.cull(ChunkPos::new(5, 0), 2);
        assert_eq!(dropped.len(), 13);
        assert!(tracked.is_empty());
        assert_eq!(tracked.missing(ChunkPos::new(5, 0), 2).len(), 13);
    }

    #[test]
    fn zero_view_distance_tracks_nothing() {
        let mut tracked = TrackedChunks::new();
        track_all(&mut tracked, ChunkPos::new(0, 0), 2);
        assert_eq!(tracked.cull(ChunkPos::new(0, 0), 0).len(), 13);
        assert!(tracked.is_empty());
        assert!(tracked.missing(ChunkPos::new(0, 0), 0).is_empty());
    }

    #[test]
    fn drain_empties() {
        let mut tracked = TrackedChunks::new();
        track_all(&mut tracked, ChunkPos::new(0, 0), 1);
        assert_eq!(tracked.drain().len(), 5);
        assert!(tracked.is_empty());
    }
}
