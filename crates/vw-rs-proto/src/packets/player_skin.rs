//! PlayerSkin (0x5D): Bidirectional.
//!
//! Sent by the client when the player changes their skin. The server
//! updates the stored appearance and relays the packet to other players.

use bytes::Bytes;

use crate::types::Uuid;

/// Appearance payloads carried by login and skin-change packets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Skin {
    pub skin_id: String,
    pub skin_data: Bytes,
    pub cape_data: Bytes,
    pub geometry_name: String,
    pub geometry_data: String,
}

/// The PlayerSkin packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSkin {
    pub uuid: Uuid,
    pub skin: Skin,
    pub new_skin_name: String,
    pub old_skin_name: String,
}
