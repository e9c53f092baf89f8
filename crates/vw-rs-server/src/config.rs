use serde::Deserialize;
use std::path::Path;

use crate::error::ConfigError;
use crate::session::visibility::MAX_VIEW_DISTANCE;

#[derive(Debug, Default, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub world: WorldSection,
    #[serde(default)]
    pub permissions: PermissionsSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    /// Maximum concurrent sessions. 0 = unlimited.
    #[serde(default = "default_max_players")]
    pub max_players: usize,
}

fn default_max_players() -> usize {
    20
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            max_players: default_max_players(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WorldSection {
    /// View distance (chunks) assigned to new sessions.
    #[serde(default = "default_view_distance")]
    pub default_view_distance: u32,
    /// Upper bound for client-requested view distances. At most 64.
    #[serde(default = "default_max_view_distance")]
    pub max_view_distance: u32,
    /// World tick period in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Ticks between full attribute resyncs. 0 = only on change.
    #[serde(default = "default_attribute_sync_interval")]
    pub attribute_sync_interval: u64,
    /// Spawn point (block coordinates) for new sessions.
    #[serde(default = "default_spawn")]
    pub spawn: [f32; 3],
}

fn default_view_distance() -> u32 {
    4
}

fn default_max_view_distance() -> u32 {
    8
}

fn default_tick_interval_ms() -> u64 {
    50
}

fn default_attribute_sync_interval() -> u64 {
    20
}

fn default_spawn() -> [f32; 3] {
    [0.5, 5.62, 0.5]
}

impl Default for WorldSection {
    fn default() -> Self {
        Self {
            default_view_distance: default_view_distance(),
            max_view_distance: default_max_view_distance(),
            tick_interval_ms: default_tick_interval_ms(),
            attribute_sync_interval: default_attribute_sync_interval(),
            spawn: default_spawn(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PermissionsSection {
    #[serde(default = "default_group_name")]
    pub default_group: String,
    #[serde(default)]
    pub groups: Vec<GroupDefinition>,
}

fn default_group_name() -> String {
    "member".into()
}

impl Default for PermissionsSection {
    fn default() -> Self {
        Self {
            default_group: default_group_name(),
            groups: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupDefinition {
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub inherits: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ServerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.world.max_view_distance < self.world.default_view_distance {
            return Err(ConfigError::Invalid(format!(
                "max_view_distance ({}) is below default_view_distance ({})",
                self.world.max_view_distance, self.world.default_view_distance
            )));
        }
        if self.world.max_view_distance > MAX_VIEW_DISTANCE {
            return Err(ConfigError::Invalid(format!(
                "max_view_distance ({}) exceeds {MAX_VIEW_DISTANCE}",
                self.world.max_view_distance
            )));
        }
        if self.world.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick_interval_ms must be positive".into()));
        }
        let groups = &self.permissions.groups;
        if !groups.is_empty() && !groups.iter().any(|g| g.name == self.permissions.default_group) {
            return Err(ConfigError::Invalid(format!(
                "default_group {} is not defined",
                self.permissions.default_group
            )));
        }
        for group in groups {
            if let Some(parent) = &group.inherits {
                if !groups.iter().any(|g| &g.name == parent) {
                    return Err(ConfigError::Invalid(format!(
                        "group {} inherits unknown group {parent}",
                        group.name
                    )));
                }
            }
        }
        Ok(())
    }
}
