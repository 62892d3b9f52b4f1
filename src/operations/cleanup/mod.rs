//! Mesh conditioning and post-build cleanup.

mod dissolve;
mod merge;
mod normals;
mod remove_material;
mod triangulate;

pub use dissolve::LimitedDissolve;
pub use merge::MergeByDistance;
pub use normals::{FlipNormals, NormalSide, RecalculateNormals};
pub use remove_material::RemoveMaterialFaces;
pub use triangulate::Triangulate;
