//! Game packet definitions.
//!
//! Every packet the core reads or writes is a variant of [`Packet`]; the
//! variant's wire id is available through [`Packet::id`].

pub mod chunk_radius_updated;
pub mod disconnect;
pub mod level_chunk;
pub mod login;
pub mod move_player;
pub mod play_status;
pub mod player_skin;
pub mod remove_entity;
pub mod request_chunk_radius;
pub mod resource_packs_info;
pub mod set_local_player_as_initialized;
pub mod text;
pub mod update_attributes;

pub use chunk_radius_updated::ChunkRadiusUpdated;
pub use disconnect::Disconnect;
pub use level_chunk::LevelChunk;
pub use login::LoginPacket;
pub use move_player::{MoveMode, MovePlayer};
pub use play_status::{PlayStatus, PlayStatusType};
pub use player_skin::{PlayerSkin, Skin};
pub use remove_entity::RemoveEntity;
pub use request_chunk_radius::RequestChunkRadius;
pub use resource_packs_info::{ResourcePackInfoEntry, ResourcePacksInfo};
pub use set_local_player_as_initialized::SetLocalPlayerAsInitialized;
pub use text::{Text, TextType};
pub use update_attributes::{AttributeEntry, UpdateAttributes};

/// Game packet IDs.
pub mod id {
    pub const LOGIN: u32 = 0x01;
    pub const PLAY_STATUS: u32 = 0x02;
    pub const DISCONNECT: u32 = 0x05;
    pub const RESOURCE_PACKS_INFO: u32 = 0x06;
    pub const TEXT: u32 = 0x09;
    pub const REMOVE_ENTITY: u32 = 0x0E;
    pub const MOVE_PLAYER: u32 = 0x13;
    pub const UPDATE_ATTRIBUTES: u32 = 0x1D;
    pub const LEVEL_CHUNK: u32 = 0x3A;
    pub const REQUEST_CHUNK_RADIUS: u32 = 0x45;
    pub const CHUNK_RADIUS_UPDATED: u32 = 0x46;
    pub const PLAYER_SKIN: u32 = 0x5D;
    pub const SET_LOCAL_PLAYER_AS_INITIALIZED: u32 = 0x71;
}

/// A decoded game packet.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Login(LoginPacket),
    PlayStatus(PlayStatus),
    Disconnect(Disconnect),
    ResourcePacksInfo(ResourcePacksInfo),
    Text(Text),
    RemoveEntity(RemoveEntity),
    MovePlayer(MovePlayer),
    UpdateAttributes(UpdateAttributes),
    LevelChunk(LevelChunk),
    RequestChunkRadius(RequestChunkRadius),
    ChunkRadiusUpdated(ChunkRadiusUpdated),
    PlayerSkin(PlayerSkin),
    SetLocalPlayerAsInitialized(SetLocalPlayerAsInitialized),
    /// A packet the codec framed but has no typed form for.
    Unknown { id: u32 },
}

impl Packet {
    /// Wire id of this packet.
    pub fn id(&self) -> u32 {
        match self {
            Packet::Login(_) => id::LOGIN,
            Packet::PlayStatus(_) => id::PLAY_STATUS,
            Packet::Disconnect(_) => id::DISCONNECT,
            Packet::ResourcePacksInfo(_) => id::RESOURCE_PACKS_INFO,
            Packet::Text(_) => id::TEXT,
            Packet::RemoveEntity(_) => id::REMOVE_ENTITY,
            Packet::MovePlayer(_) => id::MOVE_PLAYER,
            Packet::UpdateAttributes(_) => id::UPDATE_ATTRIBUTES,
            Packet::LevelChunk(_) => id::LEVEL_CHUNK,
            Packet::RequestChunkRadius(_) => id::REQUEST_CHUNK_RADIUS,
            Packet::ChunkRadiusUpdated(_) => id::CHUNK_RADIUS_UPDATED,
            Packet::PlayerSkin(_) => id::PLAYER_SKIN,
            Packet::SetLocalPlayerAsInitialized(_) => id::SET_LOCAL_PLAYER_AS_INITIALIZED,
            Packet::Unknown { id } => *id,
        }
    }
}

macro_rules! impl_from_packet {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Packet {
                fn from(p: $ty) -> Self {
                    Packet::$variant(p)
                }
            }
        )*
    };
}

impl_from_packet! {
    Login => LoginPacket,
    PlayStatus => PlayStatus,
    Disconnect => Disconnect,
    ResourcePacksInfo => ResourcePacksInfo,
    Text => Text,
    RemoveEntity => RemoveEntity,
    MovePlayer => MovePlayer,
    UpdateAttributes => UpdateAttributes,
    LevelChunk => LevelChunk,
    RequestChunkRadius => RequestChunkRadius,
    ChunkRadiusUpdated => ChunkRadiusUpdated,
    PlayerSkin => PlayerSkin,
    SetLocalPlayerAsInitialized => SetLocalPlayerAsInitialized,
}
