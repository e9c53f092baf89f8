//! Per-connection player state and the visibility engine.
//!
//! A [`PlayerSession`] is composed of an [`Identity`], a [`PermissionSet`],
//! the spatial state guarded by a per-session lock, lifecycle flags and an
//! attribute map. Callers use it through the [`Permissible`], [`Movable`] and
//! [`Visible`] capability traits.
//!
//! Lock order: registry lock, then this session's spatial lock, then chunk
//! internals. Nothing here takes the registry lock.

mod attributes;
mod identity;
pub mod visibility;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;
use vw_rs_proto::packets::{
    LevelChunk, MovePlayer, Packet, RemoveEntity, Skin, Text, UpdateAttributes,
};
use vw_rs_proto::types::{ChunkPos, Rotation, Vec3};
use vw_rs_world::{chunk_coord, chunk_index, ChunkProvider, ChunkRef, ViewerId};

use crate::permissions::{Group, Permission, PermissionSet};
use crate::transport::{SessionHandle, Transport};

pub use attributes::{attribute, AttributeMap};
pub use identity::Identity;
use visibility::TrackedChunks;

/// Position, orientation and chunk subscriptions.
struct SpatialState {
    position: Vec3,
    rotation: Rotation,
    on_ground: bool,
    view_distance: u32,
    /// Chunk the last sync placed the player in; the cull anchor.
    anchor: ChunkPos,
    chunks: TrackedChunks,
    /// Set once by teardown. No visibility mutation happens afterwards.
    finalized: bool,
}

/// Outcome of a successful [`PlayerSession::finalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Finalized {
    /// Chunk the player was last synced into.
    pub anchor: ChunkPos,
    /// Whether the player was visible in the world when torn down.
    pub was_spawned: bool,
}

fn anchor_of(position: Vec3) -> ChunkPos {
    ChunkPos::new(chunk_coord(position.x), chunk_coord(position.z))
}

/// A connected player: identity, permissions and the spatial state that drives
/// chunk visibility.
///
/// Shared as `Arc<PlayerSession>` between the registry, packet handlers and the
/// world loop. Spatial fields sit behind one mutex. Chunks are fetched outside
/// it and subscribed only if still in range once it is re-taken. Once
/// [`finalize`] has run the session tracks no chunks and every visibility pass
/// is a no-op.
///
/// [`finalize`]: PlayerSession::finalize
pub struct PlayerSession {
    handle: SessionHandle,
    entity_id: i64,
    identity: Identity,
    permissions: PermissionSet,
    spatial: Mutex<SpatialState>,
    spawned: AtomicBool,
    attributes: Mutex<AttributeMap>,
    ticks_lived: AtomicU64,
    transport: Arc<dyn Transport>,
}

impl PlayerSession {
    /// Creates an unspawned session anchored at `position`. Nothing is loaded
    /// until the first movement or [`refresh_visibility`](Self::refresh_visibility).
    pub fn new(
        handle: SessionHandle,
        entity_id: i64,
        identity: Identity,
        group: Arc<Group>,
        position: Vec3,
        view_distance: u32,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            handle,
            entity_id,
            identity,
            permissions: PermissionSet::new(group),
            spatial: Mutex::new(SpatialState {
                position,
                rotation: Rotation::ZERO,
                on_ground: true,
                view_distance: view_distance.min(visibility::MAX_VIEW_DISTANCE),
                anchor: anchor_of(position),
                chunks: TrackedChunks::new(),
                finalized: false,
            }),
            spawned: AtomicBool::new(false),
            attributes: Mutex::new(AttributeMap::player_defaults()),
            ticks_lived: AtomicU64::new(0),
            transport,
        }
    }

    /// Transport connection this session writes to.
    pub fn handle(&self) -> SessionHandle {
        self.handle
    }

    /// Unique id of the player's entity (also used as its runtime id).
    pub fn entity_id(&self) -> i64 {
        self.entity_id
    }

    /// Runtime entity id sent in movement and attribute packets.
    pub fn runtime_id(&self) -> u64 {
        self.entity_id as u64
    }

    pub fn viewer_id(&self) -> ViewerId {
        ViewerId(self.runtime_id())
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn name(&self) -> &str {
        self.identity.name()
    }

    pub fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    pub fn set_permission_group(&self, group: Arc<Group>) {
        self.permissions.set_group(group);
    }

    pub fn set_skin(&self, skin: Skin) {
        self.identity.set_skin(skin);
    }

    pub fn send(&self, packet: Packet) {
        self.transport.send(self.handle, packet);
    }

    pub fn send_message(&self, message: impl Into<String>) {
        self.send(Text::raw(message).into());
    }

    pub fn is_finalized(&self) -> bool {
        self.lock_spatial().finalized
    }

    /// Marks the session visible in the world. Returns `false` if it already
    /// was, or once finalized.
    pub fn set_spawned(&self) -> bool {
        let state = self.lock_spatial();
        if state.finalized {
            return false;
        }
        !self.spawned.swap(true, Ordering::SeqCst)
    }

    /// Clamped to [`visibility::MAX_VIEW_DISTANCE`].
    pub fn set_view_distance(&self, view_distance: u32) {
        self.lock_spatial().view_distance = view_distance.min(visibility::MAX_VIEW_DISTANCE);
    }

    /// Tears down the session's visibility state: sets `finalized`, clears
    /// `spawned` and unsubscribes from every tracked chunk, all under the
    /// spatial lock. Returns `None` if the session was already finalized.
    pub fn finalize(&self) -> Option<Finalized> {
        let mut state = self.lock_spatial();
        if state.finalized {
            return None;
        }
        state.finalized = true;
        let was_spawned = self.spawned.swap(false, Ordering::SeqCst);
        let viewer = self.viewer_id();
        let chunks = state.chunks.drain();
        for chunk in &chunks {
            chunk.remove_viewer(viewer);
        }
        debug!(
            "Finalized {} ({} chunks released)",
            self.identity.name(),
            chunks.len()
        );
        Some(Finalized {
            anchor: state.anchor,
            was_spawned,
        })
    }

    /// Re-runs the cull and load passes at the current anchor, e.g. after the
    /// view distance changed. Returns `(culled, loaded)`.
    pub fn refresh_visibility(&self, world: &dyn ChunkProvider) -> (usize, usize) {
        let (culled, wanted) = {
            let mut state = self.lock_spatial();
            if state.finalized {
                return (0, 0);
            }
            let culled = self.cull(&mut state);
            let wanted = state.chunks.missing(state.anchor, state.view_distance);
            (culled, wanted)
        };
        (culled, self.stream_chunks(wanted, world))
    }

    /// Entity tick, run by the world loop. Pushes attributes when they changed
    /// or every `attribute_sync_interval` ticks.
    pub fn tick(&self, current_tick: u64, attribute_sync_interval: u64) {
        if !self.is_spawned() {
            return;
        }
        self.ticks_lived.fetch_add(1, Ordering::Relaxed);
        let periodic = attribute_sync_interval > 0 && current_tick % attribute_sync_interval == 0;
        let dirty = self.lock_attributes().take_dirty();
        if dirty || periodic {
            self.update_attributes_at(current_tick);
        }
    }

    pub fn ticks_lived(&self) -> u64 {
        self.ticks_lived.load(Ordering::Relaxed)
    }

    pub fn attribute(&self, name: &str) -> Option<f32> {
        self.lock_attributes().get(name)
    }

    /// Returns `false` for unknown attributes. Changes go out on the next tick.
    pub fn set_attribute(&self, name: &str, value: f32) -> bool {
        self.lock_attributes().set(name, value)
    }

    /// Sends the full attribute map to the client.
    pub fn update_attributes(&self) {
        self.update_attributes_at(0);
    }

    fn update_attributes_at(&self, tick: u64) {
        let attributes = self.lock_attributes().entries().to_vec();
        self.send(
            UpdateAttributes {
                entity_runtime_id: self.runtime_id(),
                attributes,
                tick,
            }
            .into(),
        );
    }

    /// Drops out-of-range chunks: unsubscribes and despawns their entities
    /// from this player. Entities stay in the chunk for other viewers.
    fn cull(&self, state: &mut SpatialState) -> usize {
        let dropped = state.chunks.cull(state.anchor, state.view_distance);
        let viewer = self.viewer_id();
        for chunk in &dropped {
            chunk.remove_viewer(viewer);
            for entity in chunk.entities() {
                if entity.unique_id == self.entity_id {
                    continue;
                }
                self.send(
                    RemoveEntity {
                        entity_unique_id: entity.unique_id,
                    }
                    .into(),
                );
            }
        }
        if !dropped.is_empty() {
            debug!(
                "{} culled {} chunks around {}",
                self.identity.name(),
                dropped.len(),
                state.anchor
            );
        }
        dropped.len()
    }

    /// Fetches `wanted` from the provider without holding the spatial lock,
    /// then subscribes to those still in range of the latest anchor.
    fn stream_chunks(&self, wanted: Vec<ChunkPos>, world: &dyn ChunkProvider) -> usize {
        if wanted.is_empty() {
            return 0;
        }
        let fetched: Vec<ChunkRef> = wanted
            .iter()
            .filter_map(|pos| world.chunk(pos.x, pos.z))
            .collect();

        let mut state = self.lock_spatial();
        if state.finalized {
            return 0;
        }
        let viewer = self.viewer_id();
        let mut loaded = 0;
        for chunk in fetched {
            if !visibility::in_range(state.anchor, chunk.pos(), state.view_distance)
                || state.chunks.contains(chunk.index())
            {
                continue;
            }
            chunk.add_viewer(viewer);
            self.send(LevelChunk::column(chunk.x(), chunk.z()).into());
            state.chunks.insert(chunk);
            loaded += 1;
        }
        if loaded > 0 {
            debug!(
                "{} loaded {loaded} chunks around {}",
                self.identity.name(),
                state.anchor
            );
        }
        loaded
    }

    fn lock_spatial(&self) -> MutexGuard<'_, SpatialState> {
        self.spatial.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_attributes(&self) -> MutexGuard<'_, AttributeMap> {
        self.attributes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Permission resolution for a session.
pub trait Permissible {
    fn has_permission(&self, name: &str) -> bool;

    /// Returns whether an explicit override with the same name was replaced.
    fn add_permission(&self, permission: Permission) -> bool;

    /// Returns whether an explicit override was removed.
    fn remove_permission(&self, name: &str) -> bool;
}

impl Permissible for PlayerSession {
    fn has_permission(&self, name: &str) -> bool {
        self.permissions.has_permission(name)
    }

    fn add_permission(&self, permission: Permission) -> bool {
        self.permissions.add_permission(permission)
    }

    fn remove_permission(&self, name: &str) -> bool {
        self.permissions.remove_permission(name)
    }
}

/// Position and orientation updates.
pub trait Movable {
    fn position(&self) -> Vec3;

    fn rotation(&self) -> Rotation;

    fn on_ground(&self) -> bool;

    /// Applies a client movement and re-runs visibility. Rotation is added to
    /// the current rotation. Returns `false` once the session is finalized.
    fn sync_move(
        &self,
        position: Vec3,
        rotation_delta: Rotation,
        on_ground: bool,
        world: &dyn ChunkProvider,
    ) -> bool;

    /// Moves the player to an absolute position and tells the client.
    fn teleport(&self, position: Vec3, rotation: Rotation, world: &dyn ChunkProvider) -> bool;
}

impl Movable for PlayerSession {
    fn position(&self) -> Vec3 {
        self.lock_spatial().position
    }

    fn rotation(&self) -> Rotation {
        self.lock_spatial().rotation
    }

    fn on_ground(&self) -> bool {
        self.lock_spatial().on_ground
    }

    fn sync_move(
        &self,
        position: Vec3,
        rotation_delta: Rotation,
        on_ground: bool,
        world: &dyn ChunkProvider,
    ) -> bool {
        let wanted = {
            let mut state = self.lock_spatial();
            if state.finalized {
                return false;
            }
            state.position = position;
            state.rotation = state.rotation + rotation_delta;
            state.on_ground = on_ground;
            state.anchor = anchor_of(position);
            self.cull(&mut state);
            state.chunks.missing(state.anchor, state.view_distance)
        };
        self.stream_chunks(wanted, world);
        true
    }

    fn teleport(&self, position: Vec3, rotation: Rotation, world: &dyn ChunkProvider) -> bool {
        let wanted = {
            let mut state = self.lock_spatial();
            if state.finalized {
                return false;
            }
            state.position = position;
            state.rotation = rotation;
            state.anchor = anchor_of(position);
            self.send(
                MovePlayer::teleport(self.runtime_id(), position, rotation, state.on_ground).into(),
            );
            self.cull(&mut state);
            state.chunks.missing(state.anchor, state.view_distance)
        };
        self.stream_chunks(wanted, world);
        true
    }
}

/// Presence in the world and chunk subscriptions.
pub trait Visible {
    fn is_spawned(&self) -> bool;

    fn view_distance(&self) -> u32;

    /// Chunk the player was last synced into.
    fn chunk_pos(&self) -> ChunkPos;

    fn has_chunk_in_use(&self, index: i64) -> bool;

    fn has_any_chunk_in_use(&self) -> bool;

    fn tracked_chunk_count(&self) -> usize;

    /// Tracked chunk positions, sorted.
    fn tracked_chunks(&self) -> Vec<ChunkPos>;

    /// Whether this player currently sees the chunk at `pos`.
    fn sees_chunk(&self, pos: ChunkPos) -> bool {
        self.has_chunk_in_use(chunk_index(pos.x, pos.z))
    }
}

impl Visible for PlayerSession {
    fn is_spawned(&self) -> bool {
        self.spawned.load(Ordering::SeqCst)
    }

    fn view_distance(&self) -> u32 {
        self.lock_spatial().view_distance
    }

    fn chunk_pos(&self) -> ChunkPos {
        self.lock_spatial().anchor
    }

    fn has_chunk_in_use(&self, index: i64) -> bool {
        self.lock_spatial().chunks.contains(index)
    }

    fn has_any_chunk_in_use(&self) -> bool {
        !self.lock_spatial().chunks.is_empty()
    }

    fn tracked_chunk_count(&self) -> usize {
        self.lock_spatial().chunks.len()
    }

    fn tracked_chunks(&self) -> Vec<ChunkPos> {
        self.lock_spatial().chunks.positions()
    }
}
