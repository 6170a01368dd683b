//! Terrain mesh module.
//!
//! Provides the heightfield mesh, decorative rock geometry and the
//! nearest-vertex height lookup used to place cameras on the surface.

mod mesh;
mod rock;
mod height;

pub use mesh::{MeshOptions, SubGeometry, TerrainMesh, Vertex, VertexId, MAX_SUBDIVISIONS};
pub use rock::{generate_rock, RockStyle};
pub use height::{nearest_surface_vertex, surface_height, HeightQuery};
