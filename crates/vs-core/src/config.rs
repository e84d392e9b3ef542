//! Studio configuration, loaded from JSON.

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("`{field}` must be a positive number, got {value}")]
    NonPositive { field: &'static str, value: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub grid_size: f64,
    pub snap_to_grid: bool,
    /// Distance under which an alignment guide is emitted.
    pub alignment_threshold: f64,
    pub max_history: usize,
    /// Pointer travel that turns a pen click into a curve drag.
    pub drag_threshold: f64,
    /// Pick radius for node editor handles.
    pub handle_hit_radius: f64,
    /// Footprint used when an asset declares no size.
    pub default_object_size: f64,
    pub min_object_scale: f64,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            grid_size: 10.0,
            snap_to_grid: false,
            alignment_threshold: 5.0,
            max_history: 50,
            drag_threshold: 5.0,
            handle_hit_radius: 8.0,
            default_object_size: 100.0,
            min_object_scale: 0.1,
        }
    }
}

impl StudioConfig {
    /// Parse and validate. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sizes = [
            ("grid_size", self.grid_size),
            ("alignment_threshold", self.alignment_threshold),
            ("drag_threshold", self.drag_threshold),
            ("handle_hit_radius", self.handle_hit_radius),
            ("default_object_size", self.default_object_size),
            ("min_object_scale", self.min_object_scale),
            ("max_history", self.max_history as f64),
        ];
        for (field, value) in sizes {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        Ok(())
    }
}
