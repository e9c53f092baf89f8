//! MovePlayer (0x13): Bidirectional.
//!
//! Inbound it carries the client's movement; outbound it corrects or
//! teleports the player.

use crate::types::{Rotation, Vec3};

/// Movement mode for MovePlayer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MoveMode {
    /// Regular position update.
    Normal = 0,
    /// Force position correction (server-authoritative reset).
    Reset = 1,
    /// Teleport.
    Teleport = 2,
    /// Rotation-only update.
    Rotation = 3,
}

/// MovePlayer packet.
#[derive(Debug, Clone, PartialEq)]
pub struct MovePlayer {
    pub runtime_entity_id: u64,
    pub position: Vec3,
    pub rotation: Rotation,
    pub mode: MoveMode,
    pub on_ground: bool,
    pub tick: u64,
}

impl MovePlayer {
    /// Regular movement update from the client.
    pub fn normal(
        runtime_entity_id: u64,
        position: Vec3,
        rotation: Rotation,
        on_ground: bool,
    ) -> Self {
        Self {
            runtime_entity_id,
            position,
            rotation,
            mode: MoveMode::Normal,
            on_ground,
            tick: 0,
        }
    }

    /// Server-issued teleport.
    pub fn teleport(
        runtime_entity_id: u64,
        position: Vec3,
        rotation: Rotation,
        on_ground: bool,
    ) -> Self {
        Self {
            mode: MoveMode::Teleport,
            ..Self::normal(runtime_entity_id, position, rotation, on_ground)
        }
    }
}
