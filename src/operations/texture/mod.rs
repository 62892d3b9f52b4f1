//! UV projection and vertex color actions.

mod auto_texture;
mod vertex_color;

pub use auto_texture::{project_uv, AutoTexture, Facing, SurfaceClass};
pub use vertex_color::SetVertexColor;
