//! Scene configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config:
//!
//! ```toml
//! game_time_scale = 0.001
//! entity_capacity = 4096
//! viewport_capacity = 2
//! ```

use serde::Deserialize;

use crate::engine::error::ConfigError;


/// Tunables applied when a scene is built.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    /// Factor applied to each tick's delta time before it is added to game time.
    pub game_time_scale: f32,

    /// Entity slots reserved up front.
    pub entity_capacity: usize,

    /// Viewport slots reserved up front.
    pub viewport_capacity: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            game_time_scale: 0.001,
            entity_capacity: 1024,
            viewport_capacity: 4,
        }
    }
}

impl SceneConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: SceneConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.game_time_scale.is_finite() || self.game_time_scale <= 0.0 {
            return Err(ConfigError::InvalidTimeScale(self.game_time_scale));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        assert_eq!(SceneConfig::from_toml_str("").unwrap(), SceneConfig::default());
    }

    #[test]
    fn fields_override_defaults() {
        let config = SceneConfig::from_toml_str("game_time_scale = 1.0\nentity_capacity = 16").unwrap();
        assert_eq!(config.game_time_scale, 1.0);
        assert_eq!(config.entity_capacity, 16);
        assert_eq!(config.viewport_capacity, 4);
    }

    #[test]
    fn rejects_non_positive_scale() {
        let err = SceneConfig::from_toml_str("game_time_scale = -2.0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeScale(scale) if scale == -2.0));
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(matches!(
            SceneConfig::from_toml_str("tick_rate = 60"),
            Err(ConfigError::Parse(_))
        ));
    }
}
