use std::path::Path;

use serde::{
    Deserialize,
    Serialize
};

use crate::game::{
    math::Vector2F,
    physics::PhysicsSettings,
    scene::DEFAULT_SCENE_NAME,
    world::{WorldSettings, DEFAULT_WINDOW_SIZE},
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IoError, reason='{0}'")]
    Io(#[from] std::io::Error),

    #[error("Malformed config, reason='{0}'")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub window_width: u32,
    pub window_height: u32,
    pub physics: PhysicsSettings,
    /// Frames per second cap, `None` runs uncapped.
    pub max_framerate: Option<u32>,
    /// Name of the empty scene a game starts in.
    pub default_scene: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_width: DEFAULT_WINDOW_SIZE.x as u32,
            window_height: DEFAULT_WINDOW_SIZE.y as u32,
            physics: PhysicsSettings::default(),
            max_framerate: Some(60),
            default_scene: DEFAULT_SCENE_NAME.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn window_size(&self) -> Vector2F {
        Vector2F::new(self.window_width as f32, self.window_height as f32)
    }

    pub fn world_settings(&self) -> WorldSettings {
        WorldSettings {
            window_size: self.window_size(),
            physics: self.physics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_gives_defaults() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.world_settings(), WorldSettings::default());
    }

    #[test]
    fn test_partial_json_overrides_fields() {
        let config = EngineConfig::from_json_str(r#"{
            "window_width": 800,
            "physics": { "gravity": { "x": 0.0, "y": 9.81 } },
            "max_framerate": null
        }"#).unwrap();

        assert_eq!(config.window_size(), Vector2F::new(800.0, 1080.0));
        assert_eq!(config.physics.gravity, Vector2F::new(0.0, 9.81));
        assert_eq!(config.physics.rigidbody_separation, 0.0625);
        assert_eq!(config.max_framerate, None);
        assert_eq!(config.default_scene, DEFAULT_SCENE_NAME);
    }

    #[test]
    fn test_pretty_json_reads_back() {
        let config = EngineConfig {
            window_width: 1280,
            max_framerate: Some(144),
            ..Default::default()
        };
        let json = config.to_json_pretty().unwrap();
        assert_eq!(EngineConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(EngineConfig::from_json_str("{ window_width: "), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(EngineConfig::load("/definitely/not/here.json"), Err(ConfigError::Io(_))));
    }
}
