//! Build configuration.
//!
//! Every build receives a [`BuildConfig`] explicitly. Field names serialize
//! in camelCase so a host can hand over its scene settings as JSON.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::math::Vector3;

/// Highest supported decimal precision for vertex rounding.
pub const MAX_PRECISION: u32 = 6;

/// Largest accepted inflation epsilon.
pub const MAX_OVERLAP_EPSILON: f64 = 0.01;

/// Settings for one level build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildConfig {
    /// Decimal places kept on vertices and origins.
    pub map_precision: u32,
    pub auto_smooth: AutoSmoothConfig,
    /// Faces using a material of this name are deleted after the build.
    /// Blank disables removal.
    pub remove_material_name: String,
    /// Preferred name of the shared color layer.
    pub color_attribute_name: String,
    pub boolean_overlap: OverlapConfig,
    pub post_build_snap: PostBuildSnapConfig,
    pub live_snap: LiveSnapConfig,
    pub dissolve: DissolveConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            map_precision: 3,
            auto_smooth: AutoSmoothConfig::default(),
            remove_material_name: String::new(),
            color_attribute_name: "Attribute".to_owned(),
            boolean_overlap: OverlapConfig::default(),
            post_build_snap: PostBuildSnapConfig::default(),
            live_snap: LiveSnapConfig::default(),
            dissolve: DissolveConfig::default(),
        }
    }
}

/// Angle-based smoothing of the level mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AutoSmoothConfig {
    pub enabled: bool,
    pub angle_degrees: f64,
}

impl Default for AutoSmoothConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            angle_degrees: 30.0,
        }
    }
}

/// Operand inflation. Scaling each operand by `1 + epsilon` avoids exactly
/// coplanar faces between neighbouring brushes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverlapConfig {
    pub enabled: bool,
    pub epsilon: f64,
}

impl Default for OverlapConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            epsilon: 1e-4,
        }
    }
}

impl OverlapConfig {
    /// Uniform scale factor applied to operands.
    #[must_use]
    pub fn factor(&self) -> f64 {
        if self.enabled {
            1.0 + self.epsilon
        } else {
            1.0
        }
    }
}

/// Uniform world-grid snap applied once the build finishes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PostBuildSnapConfig {
    pub enabled: bool,
    pub step: f64,
}

impl Default for PostBuildSnapConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            step: 1.0,
        }
    }
}

/// Per-axis grid for the live snap observer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LiveSnapConfig {
    pub enabled: bool,
    pub grid_x: f64,
    pub grid_y: f64,
    pub grid_z: f64,
}

impl Default for LiveSnapConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            grid_x: 1.0,
            grid_y: 1.0,
            grid_z: 1.0,
        }
    }
}

impl LiveSnapConfig {
    /// Grid steps as a vector.
    #[must_use]
    pub fn grid(&self) -> Vector3 {
        Vector3::new(self.grid_x, self.grid_y, self.grid_z)
    }
}

/// Post-build merging of nearly coplanar neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DissolveConfig {
    pub enabled: bool,
    pub angle_degrees: f64,
}

impl Default for DissolveConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            angle_degrees: 5.0,
        }
    }
}

fn check_range(option: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            option,
            value,
            min,
            max,
        })
    }
}

fn check_positive(option: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { option, value })
    }
}

impl BuildConfig {
    /// Parses a JSON document and validates it. Missing fields take their
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and the range
    /// errors of [`BuildConfig::validate`].
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every option against its accepted range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] or [`ConfigError::NotPositive`]
    /// for the first offending option.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range(
            "mapPrecision",
            f64::from(self.map_precision),
            0.0,
            f64::from(MAX_PRECISION),
        )?;
        check_range(
            "autoSmooth.angleDegrees",
            self.auto_smooth.angle_degrees,
            0.0,
            180.0,
        )?;
        check_range(
            "booleanOverlap.epsilon",
            self.boolean_overlap.epsilon,
            0.0,
            MAX_OVERLAP_EPSILON,
        )?;
        check_positive("postBuildSnap.step", self.post_build_snap.step)?;
        check_positive("liveSnap.gridX", self.live_snap.grid_x)?;
        check_positive("liveSnap.gridY", self.live_snap.grid_y)?;
        check_positive("liveSnap.gridZ", self.live_snap.grid_z)?;
        check_range(
            "dissolve.angleDegrees",
            self.dissolve.angle_degrees,
            0.0,
            180.0,
        )?;
        Ok(())
    }

    /// Trimmed name of the material to strip, if removal is enabled.
    #[must_use]
    pub fn removal_target(&self) -> Option<&str> {
        let name = self.remove_material_name.trim();
        (!name.is_empty()).then_some(name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = BuildConfig::default();
        config.validate().unwrap();
        assert_eq!(config.map_precision, 3);
        assert!(config.auto_smooth.enabled);
        assert_eq!(config.color_attribute_name, "Attribute");
        assert!(config.removal_target().is_none());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = BuildConfig::from_json(
            r#"{"mapPrecision": 2, "booleanOverlap": {"enabled": true}, "removeMaterialName": " nodraw "}"#,
        )
        .unwrap();
        assert_eq!(config.map_precision, 2);
        assert!(config.boolean_overlap.enabled);
        assert!((config.boolean_overlap.epsilon - 1e-4).abs() < f64::EPSILON);
        assert!((config.boolean_overlap.factor() - 1.0001).abs() < 1e-12);
        assert_eq!(config.removal_target(), Some("nodraw"));
        assert!((config.live_snap.grid_z - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn precision_above_six_is_rejected() {
        let err = BuildConfig::from_json(r#"{"mapPrecision": 7}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange {
                option: "mapPrecision",
                ..
            }
        ));
    }

    #[test]
    fn zero_grid_is_rejected() {
        let mut config = BuildConfig::default();
        config.live_snap.grid_y = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive {
                option: "liveSnap.gridY",
                ..
            })
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            BuildConfig::from_json("{mapPrecision"),
            Err(ConfigError::Parse(_))
        ));
    }
}
