use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Every render flag, with its default enumerated once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub show_grid: bool,
    pub debug: bool,
    pub debug_level: u32,
    /// Edge length of the square shadow map; 0 disables the shadow pass.
    pub shadow_map_size: u32,
    pub wireframe: bool,
    /// Clear the surface to `background` before the final draw.
    pub clear_pass: bool,
    pub shadow_pass: bool,
    pub antialiasing: bool,
    pub show_hitbox: bool,
    /// Render through offscreen passes and the composite step.
    pub post_process: bool,
    pub background: [f32; 4],
    pub shadow_color: [f32; 4],
    pub fog_max: f32,
    pub fog_density: f32,
    pub fog_start_offset: f32,
    pub grid_size: f32,
    pub grid_count: u32,
    pub resize_debounce_ms: u64,
    pub max_frame_delta_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            show_grid: true,
            debug: false,
            debug_level: 0,
            shadow_map_size: 2048,
            wireframe: false,
            clear_pass: true,
            shadow_pass: true,
            antialiasing: true,
            show_hitbox: false,
            post_process: true,
            background: [0.0, 0.0, 0.0, 0.0],
            shadow_color: [0.0, 0.0, 0.0, 0.33],
            fog_max: 0.15,
            fog_density: 50.0,
            fog_start_offset: 0.02,
            grid_size: 1.0,
            grid_count: 400,
            resize_debounce_ms: 10,
            max_frame_delta_ms: 250,
        }
    }
}

impl RenderConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a JSON config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        tracing::debug!(path = %path.display(), "loaded render config");
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_json()?).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Whether the shadow pass should be created at all.
    pub fn shadows_enabled(&self) -> bool {
        self.shadow_pass && self.shadow_map_size > 0
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    pub fn max_frame_delta(&self) -> Duration {
        Duration::from_millis(self.max_frame_delta_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RenderConfig::default();
        assert!(config.show_grid && config.clear_pass && config.post_process);
        assert_eq!(config.shadow_map_size, 2048);
        assert_eq!(config.shadow_color, [0.0, 0.0, 0.0, 0.33]);
        assert_eq!(config.grid_count, 400);
        assert_eq!(config.resize_debounce(), Duration::from_millis(10));
        assert!(config.shadows_enabled());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = RenderConfig::from_json(r#"{ "show_grid": false, "shadow_map_size": 0 }"#).unwrap();
        assert!(!config.show_grid);
        assert!(!config.shadows_enabled());
        assert_eq!(config.fog_density, 50.0);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("render.json");
        let config = RenderConfig {
            post_process: false,
            background: [0.1, 0.1, 0.15, 1.0],
            ..RenderConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(RenderConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = RenderConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(RenderConfig::from_json("{ show_grid"), Err(ConfigError::Parse(_))));
    }
}
