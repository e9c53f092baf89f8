//! Login (0x01): Client → Server.

use bytes::Bytes;

use crate::types::Uuid;

/// Decoded login request: the claimed identity plus appearance payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginPacket {
    pub protocol_version: i32,
    pub username: String,
    pub client_uuid: Uuid,
    pub client_xuid: String,
    pub client_id: i64,
    /// Locale code, e.g. `en_US`.
    pub language: String,
    pub skin_id: String,
    /// Raw RGBA skin bitmap.
    pub skin_data: Bytes,
    /// Raw RGBA cape bitmap (may be empty).
    pub cape_data: Bytes,
    pub geometry_name: String,
    /// Geometry definition JSON.
    pub geometry_data: String,
}

impl LoginPacket {
    /// Minimal login carrying only a username, used by tests and tools.
    pub fn with_username(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }
}
