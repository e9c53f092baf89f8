//! ResourcePacksInfo (0x06): Server → Client.

use crate::types::Uuid;

/// Resource pack entry offered to the client.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourcePackInfoEntry {
    pub pack_id: Uuid,
    pub version: String,
    pub size: u64,
}

/// Tells the client what resource/behavior packs are available.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourcePacksInfo {
    pub must_accept: bool,
    pub has_scripts: bool,
    pub packs: Vec<ResourcePackInfoEntry>,
}
