//! UpdateAttributes (0x1D): Server → Client.
//!
//! Syncs entity attributes (health, movement speed, etc.) to the client.

/// A single attribute entry.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeEntry {
    pub min: f32,
    pub max: f32,
    pub current: f32,
    pub default: f32,
    pub name: String,
}

impl AttributeEntry {
    /// An attribute starting at its default value.
    pub fn new(name: impl Into<String>, min: f32, max: f32, default: f32) -> Self {
        Self {
            min,
            max,
            current: default,
            default,
            name: name.into(),
        }
    }
}

/// UpdateAttributes packet.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateAttributes {
    pub entity_runtime_id: u64,
    pub attributes: Vec<AttributeEntry>,
    pub tick: u64,
}
