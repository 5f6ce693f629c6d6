//! Session configuration.

use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::shapes::SerializableColor;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Tunables for a whiteboard session. Every field has a default, so a
/// config file only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Snapshots kept before the oldest is dropped.
    pub history_capacity: usize,
    /// Where new objects are inserted.
    pub default_origin: Point,
    pub surface_width: f64,
    pub surface_height: f64,
    /// Vertical position of the default section row.
    pub section_top: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Factor applied per zoom-in / zoom-out step.
    pub zoom_step: f64,
    /// Pen color, written as `#rrggbb` in config files.
    #[serde(with = "hex_color")]
    pub draw_color: SerializableColor,
    pub draw_brush_width: f64,
    pub eraser_brush_width: f64,
    /// Ticks a deferred edit-focus request waits for its target.
    pub focus_retry_attempts: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            default_origin: Point::new(100.0, 100.0),
            surface_width: 1200.0,
            surface_height: 800.0,
            section_top: 80.0,
            min_zoom: 0.1,
            max_zoom: 10.0,
            zoom_step: 1.1,
            draw_color: SerializableColor::black(),
            draw_brush_width: 2.0,
            eraser_brush_width: 20.0,
            focus_retry_attempts: 10,
        }
    }
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the session cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason| Err(ConfigError::Invalid { field, reason });
        if !(self.min_zoom.is_finite() && self.min_zoom > 0.0) {
            return invalid("min_zoom", "must be a positive number");
        }
        if !self.max_zoom.is_finite() || self.max_zoom < self.min_zoom {
            return invalid("max_zoom", "must not be below min_zoom");
        }
        if !(self.zoom_step.is_finite() && self.zoom_step > 1.0) {
            return invalid("zoom_step", "must be greater than 1");
        }
        if !(self.draw_brush_width.is_finite() && self.draw_brush_width > 0.0) {
            return invalid("draw_brush_width", "must be a positive number");
        }
        if !(self.eraser_brush_width.is_finite() && self.eraser_brush_width > 0.0) {
            return invalid("eraser_brush_width", "must be a positive number");
        }
        if !(self.surface_width.is_finite() && self.surface_height.is_finite()) {
            return invalid("surface_width", "must be finite");
        }
        Ok(())
    }

    /// Load from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

mod hex_color {
    use crate::shapes::SerializableColor;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(color: &SerializableColor, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&color.to_hex())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<SerializableColor, D::Error> {
        let text = String::deserialize(d)?;
        SerializableColor::from_hex(&text)
            .ok_or_else(|| D::Error::custom(format!("not a hex color: {:?}", text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = SessionConfig::from_json(r#"{"history_capacity": 5, "zoom_step": 1.25}"#)
            .unwrap();
        assert_eq!(config.history_capacity, 5);
        assert!((config.zoom_step - 1.25).abs() < f64::EPSILON);
        assert_eq!(config.default_origin, Point::new(100.0, 100.0));
        assert_eq!(config.focus_retry_attempts, 10);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            SessionConfig::from_json("{\"history_capacity\": \"lots\"}"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_inverted_zoom_limits_are_rejected() {
        let err = SessionConfig::from_json(r#"{"min_zoom": 5.0, "max_zoom": 1.0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "max_zoom", .. }));
        assert!(matches!(
            SessionConfig::from_json(r#"{"zoom_step": 0.5}"#),
            Err(ConfigError::Invalid { field: "zoom_step", .. })
        ));
        assert!(matches!(
            SessionConfig::from_json(r#"{"min_zoom": 0}"#),
            Err(ConfigError::Invalid { field: "min_zoom", .. })
        ));
    }

    #[test]
    fn test_draw_color_is_hex() {
        let config = SessionConfig::from_json(r##"{"draw_color": "#1565c0"}"##).unwrap();
        assert_eq!(config.draw_color, SerializableColor::rgb(0x15, 0x65, 0xc0));

        let json = serde_json::to_value(SessionConfig::default()).unwrap();
        assert_eq!(json["draw_color"], "#000000");

        assert!(matches!(
            SessionConfig::from_json(r#"{"draw_color": "blue"}"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SessionConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
