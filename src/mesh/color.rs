use tracing::debug;

use super::PolyMesh;
use crate::capabilities::HostCapabilities;

/// Linear RGBA color.
pub type Rgba = [f32; 4];

/// Opaque white, the fill for newly created layers.
pub const WHITE: Rgba = [1.0, 1.0, 1.0, 1.0];

/// Legacy layer names probed after the configured one.
pub const FALLBACK_LAYER_NAMES: [&str; 2] = ["Col", "Color"];

/// A named per-corner color channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorLayer {
    name: String,
    values: Vec<Rgba>,
}

impl ColorLayer {
    /// Creates a layer with `len` corners set to `fill`.
    #[must_use]
    pub fn filled(name: impl Into<String>, len: usize, fill: Rgba) -> Self {
        Self {
            name: name.into(),
            values: vec![fill; len],
        }
    }

    /// Creates a layer from explicit values.
    #[must_use]
    pub fn from_values(name: impl Into<String>, values: Vec<Rgba>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Layer name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Per-corner values in face order.
    #[must_use]
    pub fn values(&self) -> &[Rgba] {
        &self.values
    }

    /// Mutable per-corner values.
    pub fn values_mut(&mut self) -> &mut [Rgba] {
        &mut self.values
    }
}

/// The color layers of a mesh and which one is active.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorAttributes {
    layers: Vec<ColorLayer>,
    active: Option<usize>,
}

impl ColorAttributes {
    /// Wraps a single layer and makes it active.
    #[must_use]
    pub fn single(layer: ColorLayer) -> Self {
        Self {
            layers: vec![layer],
            active: Some(0),
        }
    }

    /// Number of layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns `true` if there are no layers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// All layers.
    #[must_use]
    pub fn layers(&self) -> &[ColorLayer] {
        &self.layers
    }

    /// Mutable access to all layers.
    pub fn layers_mut(&mut self) -> &mut [ColorLayer] {
        &mut self.layers
    }

    /// Index of the layer called `name`.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|l| l.name == name)
    }

    /// Index of the active layer.
    #[must_use]
    pub fn active_index(&self) -> Option<usize> {
        self.active.filter(|&i| i < self.layers.len())
    }

    /// The active layer.
    #[must_use]
    pub fn active(&self) -> Option<&ColorLayer> {
        self.active_index().map(|i| &self.layers[i])
    }

    /// Mutable access to the active layer.
    pub fn active_mut(&mut self) -> Option<&mut ColorLayer> {
        let index = self.active_index()?;
        self.layers.get_mut(index)
    }

    /// Makes the layer at `index` active. Out-of-range indices are ignored.
    pub fn set_active(&mut self, index: usize) {
        if index < self.layers.len() {
            self.active = Some(index);
        }
    }

    /// Appends a layer of `len` corners filled with `fill` and returns its
    /// index. The first layer added becomes active.
    pub fn add(&mut self, name: impl Into<String>, len: usize, fill: Rgba) -> usize {
        self.layers.push(ColorLayer::filled(name, len, fill));
        let index = self.layers.len() - 1;
        if self.active_index().is_none() {
            self.active = Some(index);
        }
        index
    }

    /// Builds new layers whose values are taken from the corners listed in
    /// `sources`. Missing source corners read as white.
    #[must_use]
    pub fn gather(&self, sources: &[usize]) -> Self {
        let layers = self
            .layers
            .iter()
            .map(|layer| ColorLayer {
                name: layer.name.clone(),
                values: sources
                    .iter()
                    .map(|&s| layer.values.get(s).copied().unwrap_or(WHITE))
                    .collect(),
            })
            .collect();
        Self {
            layers,
            active: self.active,
        }
    }
}

/// Makes sure the mesh has an active color layer and returns its index.
///
/// Probes `preferred`, then the legacy names, then whatever layer is already
/// active; only when none exists is a white layer called `preferred`
/// created. Returns `None` without touching the mesh when the host has no
/// color attribute support.
pub fn ensure_color_layer(
    mesh: &mut PolyMesh,
    preferred: &str,
    capabilities: &HostCapabilities,
) -> Option<usize> {
    if !capabilities.color_attributes {
        return None;
    }
    let corners = mesh.corner_count();
    let colors = mesh.colors_mut();
    let found = std::iter::once(preferred)
        .chain(FALLBACK_LAYER_NAMES)
        .find_map(|name| colors.find(name))
        .or_else(|| colors.active_index());
    let index = if let Some(index) = found {
        index
    } else {
        debug!(layer = preferred, "creating color layer");
        colors.add(preferred, corners, WHITE)
    };
    colors.set_active(index);
    Some(index)
}

/// Sets every corner of the active color layer to `color`.
///
/// Returns the number of corners written.
pub fn fill_color_layer(mesh: &mut PolyMesh, color: Rgba) -> usize {
    mesh.colors_mut().active_mut().map_or(0, |layer| {
        layer.values_mut().fill(color);
        layer.values().len()
    })
}
