use tracing::debug;

use crate::capabilities::HostCapabilities;
use crate::error::{ContextError, Result};
use crate::mesh::{ensure_color_layer, fill_color_layer};
use crate::scene::SceneStore;

/// Fills the active object's color layer with one opaque color.
#[derive(Debug, Clone, Copy)]
pub struct SetVertexColor {
    rgb: [f32; 3],
}

impl SetVertexColor {
    /// Creates a fill with the given RGB color.
    #[must_use]
    pub fn new(rgb: [f32; 3]) -> Self {
        Self { rgb }
    }

    /// Fills the active object's layer (creating it if needed) and returns
    /// the number of corners written. Hosts without color layers get a
    /// silent no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::NoActiveObject`] without an active object and
    /// [`ContextError::NotAMesh`] when it has no mesh.
    pub fn execute(
        &self,
        scene: &mut SceneStore,
        layer_name: &str,
        capabilities: &HostCapabilities,
    ) -> Result<usize> {
        let active = scene
            .selection()
            .active
            .ok_or(ContextError::NoActiveObject)?;
        let object = scene.object(active)?;
        let Some(mesh_id) = object.mesh else {
            return Err(ContextError::NotAMesh(object.name.clone()).into());
        };
        let mesh = scene.mesh_mut(mesh_id)?;
        if ensure_color_layer(mesh, layer_name, capabilities).is_none() {
            return Ok(0);
        }
        let [r, g, b] = self.rgb;
        let written = fill_color_layer(mesh, [r, g, b, 1.0]);
        debug!(corners = written, "filled vertex colors");
        Ok(written)
    }
}
