//! Entity attributes synced to the client with UpdateAttributes.

use vw_rs_proto::packets::AttributeEntry;

/// Names of the attributes every player carries.
pub mod attribute {
    pub const HEALTH: &str = "minecraft:health";
    pub const MOVEMENT: &str = "minecraft:movement";
    pub const HUNGER: &str = "minecraft:player.hunger";
    pub const SATURATION: &str = "minecraft:player.saturation";
}

/// Ordered attribute entries with a dirty flag, set whenever a current value
/// actually changes and cleared by [`take_dirty`](AttributeMap::take_dirty).
pub struct AttributeMap {
    entries: Vec<AttributeEntry>,
    dirty: bool,
}

impl AttributeMap {
    /// The attributes every player starts with.
    pub fn player_defaults() -> Self {
        Self {
            entries: vec![
                AttributeEntry::new(attribute::HEALTH, 0.0, 20.0, 20.0),
                AttributeEntry::new(attribute::MOVEMENT, 0.0, f32::MAX, 0.1),
                AttributeEntry::new(attribute::HUNGER, 0.0, 20.0, 20.0),
                AttributeEntry::new(attribute::SATURATION, 0.0, 20.0, 5.0),
            ],
            dirty: false,
        }
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.current)
    }

    /// Sets the current value, clamped to the attribute's range.
    /// Returns `false` for unknown attributes.
    pub fn set(&mut self, name: &str, value: f32) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|e| e.name == name) else {
            return false;
        };
        let value = value.clamp(entry.min, entry.max);
        if entry.current != value {
            entry.current = value;
            self.dirty = true;
        }
        true
    }

    pub fn entries(&self) -> &[AttributeEntry] {
        &self.entries
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_clamps_and_marks_dirty() {
        let mut map = AttributeMap::player_defaults();
        assert!(!map.take_dirty());

        assert!(map.set(attribute::HEALTH, 42.0));
        assert_eq!(map.get(attribute::HEALTH), Some(20.0));
        // Already at max: nothing changed.
        assert!(!map.take_dirty());

        assert!(map.set(attribute::HEALTH, -3.0));
        assert_eq!(map.get(attribute::HEALTH), Some(0.0));
        assert!(map.take_dirty());
        assert!(!map.take_dirty());
    }

    #[test]
    fn unknown_attribute_is_rejected() {
        let mut map = AttributeMap::player_defaults();
        assert!(!map.set("minecraft:luck", 1.0));
        assert_eq!(map.get("minecraft:luck"), None);
        assert!(!map.take_dirty());
    }
}
