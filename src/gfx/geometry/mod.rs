//! # Procedural Geometry Generation
//!
//! Shapes built in code rather than loaded from an asset file.
//!
//! ```no_run
//! use model_viewer::gfx::geometry::generate_cube;
//!
//! let lamp = generate_cube().into_mesh();
//! ```

pub mod primitives;

pub use primitives::*;

use crate::error::MeshError;
use crate::gfx::scene::mesh::Mesh;
use crate::gfx::scene::vertex::Vertex;

/// Generated geometry ready to become a [`Mesh`]
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Texture coordinates (u, v)
    pub tex_coords: Vec<[f32; 2]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
}

impl GeometryData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Builds an untextured mesh with tangents derived from the UVs
    pub fn into_mesh(self) -> Result<Mesh, MeshError> {
        let mut vertices: Vec<Vertex> = self
            .vertices
            .iter()
            .enumerate()
            .map(|(i, &position)| Vertex {
                position,
                normal: self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                tex_coords: self.tex_coords.get(i).copied().unwrap_or_default(),
                ..Default::default()
            })
            .collect();

        Mesh::calculate_tangents(&mut vertices, &self.indices);
        Mesh::new(vertices, self.indices, Vec::new())
    }
}
