//! Configuration for the culling graph, queries and region layout

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::engine::GraphParams;
use crate::graph::SearchOptions;
use crate::region::{RegionLayout, DEFAULT_REGION_HEIGHT_SH, MAX_REGION_HEIGHT_SH};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CullingConfig {
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub regions: RegionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_render_distance")]
    pub render_distance: u8,
    #[serde(default = "default_world_bottom_section_y")]
    pub world_bottom_section_y: i8,
    #[serde(default = "default_world_top_section_y")]
    pub world_top_section_y: i8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search radius in blocks
    #[serde(default = "default_search_distance")]
    pub search_distance: f32,
    #[serde(default = "default_true")]
    pub use_occlusion_culling: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    /// Region height is `1 << height_shift` sections
    #[serde(default = "default_region_height_shift")]
    pub height_shift: u32,
}

// Default values
fn default_render_distance() -> u8 {
    12
}

fn default_world_bottom_section_y() -> i8 {
    -4
}

fn default_world_top_section_y() -> i8 {
    19
}

fn default_search_distance() -> f32 {
    192.0
}

fn default_true() -> bool {
    true
}

fn default_region_height_shift() -> u32 {
    DEFAULT_REGION_HEIGHT_SH
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            render_distance: default_render_distance(),
            world_bottom_section_y: default_world_bottom_section_y(),
            world_top_section_y: default_world_top_section_y(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            search_distance: default_search_distance(),
            use_occlusion_culling: true,
        }
    }
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            height_shift: default_region_height_shift(),
        }
    }
}

impl Default for CullingConfig {
    fn default() -> Self {
        Self {
            graph: GraphConfig::default(),
            search: SearchConfig::default(),
            regions: RegionConfig::default(),
        }
    }
}

impl CullingConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: CullingConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Load configuration from a path, falling back to defaults if it is
    /// missing or invalid
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded configuration from {}", path.display());
                config
            }
            Err(ConfigError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No configuration at {}, using defaults", path.display());
                Self::default()
            }
            Err(err) => {
                log::warn!("Failed to load {}: {err}; using defaults", path.display());
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.graph.world_top_section_y < self.graph.world_bottom_section_y {
            return Err(ConfigError::Invalid(format!(
                "graph.world_top_section_y ({}) is below graph.world_bottom_section_y ({})",
                self.graph.world_top_section_y, self.graph.world_bottom_section_y
            )));
        }
        if self.graph.render_distance == 0 {
            return Err(ConfigError::Invalid(
                "graph.render_distance must be at least 1".to_string(),
            ));
        }
        if self.regions.height_shift > MAX_REGION_HEIGHT_SH {
            return Err(ConfigError::Invalid(format!(
                "regions.height_shift ({}) exceeds {MAX_REGION_HEIGHT_SH}",
                self.regions.height_shift
            )));
        }
        if !(self.search.search_distance.is_finite() && self.search.search_distance > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "search.search_distance ({}) must be a positive number",
                self.search.search_distance
            )));
        }
        Ok(())
    }

    pub fn graph_params(&self) -> GraphParams {
        GraphParams::new(
            self.graph.render_distance,
            self.graph.world_bottom_section_y,
            self.graph.world_top_section_y,
        )
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            search_distance: self.search.search_distance,
            use_occlusion_culling: self.search.use_occlusion_culling,
        }
    }

    pub fn region_layout(&self) -> Result<RegionLayout, ConfigError> {
        RegionLayout::new(self.regions.height_shift).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "regions.height_shift ({}) exceeds {MAX_REGION_HEIGHT_SH}",
                self.regions.height_shift
            ))
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "config I/O error: {err}"),
            ConfigError::Parse(err) => write!(f, "config parse error: {err}"),
            ConfigError::Serialize(err) => write!(f, "config serialize error: {err}"),
            ConfigError::Invalid(reason) => write!(f, "invalid config: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
            ConfigError::Serialize(err) => Some(err),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::Serialize(err)
    }
}
