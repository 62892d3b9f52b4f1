//! Optional host features, negotiated once per session.

use serde::{Deserialize, Serialize};

/// Which optional mesh features the host supports.
///
/// The build path checks these flags instead of probing the host at each
/// call site. A missing feature turns the matching step into a no-op or a
/// simpler fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct HostCapabilities {
    /// Per-corner color layers.
    pub color_attributes: bool,
    /// Orientation-consistent normal recalculation. Without it normals are
    /// flipped face by face.
    pub consistent_normals: bool,
    /// Coplanar face merging after the build.
    pub limited_dissolve: bool,
    /// Angle-based smoothing on the level mesh.
    pub auto_smooth: bool,
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self {
            color_attributes: true,
            consistent_normals: true,
            limited_dissolve: true,
            auto_smooth: true,
        }
    }
}

impl HostCapabilities {
    /// A host with none of the optional features.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            color_attributes: false,
            consistent_normals: false,
            limited_dissolve: false,
            auto_smooth: false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_supported() {
        let caps: HostCapabilities = serde_json::from_str(r#"{"limitedDissolve": false}"#).unwrap();
        assert!(caps.color_attributes);
        assert!(!caps.limited_dissolve);
    }
}
