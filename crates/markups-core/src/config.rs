//! Representation configuration
//!
//! Tunables for occlusion testing, depth biasing, picking and per-category
//! styling. Stored as RON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{Category, CategoryMap};

/// Limit of the coincident topology offset range.
pub const MAX_RELATIVE_OFFSET: f64 = 65000.0;

/// Default relative offset for occluded primitives.
pub const DEFAULT_OCCLUDED_RELATIVE_OFFSET: f64 = -25000.0;

/// Configuration error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

/// Visual properties of one category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryStyle {
    pub color: [f32; 3],
    pub opacity: f32,
    pub text_background_opacity: f32,
    pub occluded_opacity: f32,
    pub occluded_text_background_opacity: f32,
    pub font_size: u32,
}

impl CategoryStyle {
    /// Default style for a category.
    pub fn for_category(category: Category) -> Self {
        let color = match category {
            Category::Unselected => [0.4, 1.0, 1.0],
            Category::Selected => [1.0, 0.5, 0.5],
            Category::Active => [0.4, 1.0, 0.0],
            Category::Project => [1.0, 0.5, 0.5],
            Category::ProjectBehind => [1.0, 0.75, 0.75],
        };
        Self {
            color,
            opacity: 1.0,
            text_background_opacity: 0.0,
            occluded_opacity: 0.3,
            occluded_text_background_opacity: 0.0,
            font_size: 15,
        }
    }
}

/// Configuration of a 3D markups representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepresentationConfig {
    /// Configuration format version
    #[serde(default)]
    pub version: u32,
    /// Depth bias of occluded primitives relative to visible ones.
    /// Positive values move occluded primitives away from the camera.
    pub occluded_relative_offset: f64,
    /// Relative epsilon of the eye-space depth comparison.
    pub depth_epsilon: f32,
    /// Fraction of the control point size a point may sink behind the
    /// stored depth and still count as visible (its own glyph covers it).
    pub self_occlusion_factor: f32,
    /// Fixed pick tolerance in world units. `None` uses half the control
    /// point size.
    #[serde(default)]
    pub pick_tolerance_world: Option<f32>,
    /// Hide the name label when every control point is occluded.
    pub hide_text_if_all_points_occluded: bool,
    pub styles: CategoryMap<CategoryStyle>,
}

impl Default for RepresentationConfig {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            occluded_relative_offset: DEFAULT_OCCLUDED_RELATIVE_OFFSET,
            depth_epsilon: 1e-3,
            self_occlusion_factor: 0.7,
            pick_tolerance_world: None,
            hide_text_if_all_points_occluded: false,
            styles: CategoryMap::from_fn(CategoryStyle::for_category),
        }
    }
}

impl RepresentationConfig {
    /// Current configuration version
    pub const CURRENT_VERSION: u32 = 1;

    /// Parses a configuration from RON text.
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let mut config: Self =
            ron::from_str(text).map_err(|e| ConfigError::Deserialize(e.to_string()))?;
        config.occluded_relative_offset = clamp_relative_offset(config.occluded_relative_offset);
        Ok(config)
    }

    /// Loads a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config = Self::from_ron(&text)?;
        tracing::info!("Loaded representation config from {:?}", path);
        Ok(config)
    }

    /// Serializes the configuration as pretty RON.
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Writes the configuration to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }
        std::fs::write(path, self.to_ron()?).map_err(|e| ConfigError::Io(e.to_string()))?;
        tracing::info!("Saved representation config to {:?}", path);
        Ok(())
    }
}

/// Clamps a coincident topology offset into the supported range.
pub fn clamp_relative_offset(offset: f64) -> f64 {
    if offset.is_nan() {
        return DEFAULT_OCCLUDED_RELATIVE_OFFSET;
    }
    offset.clamp(-MAX_RELATIVE_OFFSET, MAX_RELATIVE_OFFSET)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RepresentationConfig::default();
        assert_eq!(config.occluded_relative_offset, -25000.0);
        assert_eq!(config.styles.len(), Category::COUNT);
        assert_eq!(config.styles[Category::Active].color, [0.4, 1.0, 0.0]);
    }

    #[test]
    fn test_ron_round_trip() {
        let mut config = RepresentationConfig::default();
        config.occluded_relative_offset = 1200.0;
        config.styles[Category::Selected].font_size = 22;

        let text = config.to_ron().unwrap();
        let parsed = RepresentationConfig::from_ron(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_offset_is_clamped_on_load() {
        let mut config = RepresentationConfig::default();
        config.occluded_relative_offset = -90000.0;
        let text = config.to_ron().unwrap();
        let parsed = RepresentationConfig::from_ron(&text).unwrap();
        assert_eq!(parsed.occluded_relative_offset, -MAX_RELATIVE_OFFSET);
    }

    #[test]
    fn test_invalid_ron_is_reported() {
        let err = RepresentationConfig::from_ron("(occluded_relative_offset: ").unwrap_err();
        assert!(matches!(err, ConfigError::Deserialize(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = RepresentationConfig::load("/nonexistent/markups.ron").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_clamp_nan() {
        assert_eq!(clamp_relative_offset(f64::NAN), DEFAULT_OCCLUDED_RELATIVE_OFFSET);
        assert_eq!(clamp_relative_offset(70000.0), MAX_RELATIVE_OFFSET);
    }
}
