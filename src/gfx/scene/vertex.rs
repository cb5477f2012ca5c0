//! # Vertex Data Structures
//!
//! GPU-compatible vertex format shared by every mesh the viewer draws.

/// A 3D vertex with position, normal, texture coordinate and tangent frame.
///
/// The `#[repr(C)]` layout is uploaded as-is; every mesh of a model uses the
/// same 56-byte stride.
///
/// # Examples
///
/// ```no_run
/// use model_viewer::gfx::scene::vertex::Vertex;
///
/// let vertex = Vertex {
///     position: [0.0, 1.0, 0.0],
///     normal: [0.0, 1.0, 0.0],
///     ..Default::default()
/// };
/// ```
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Object-space position [x, y, z]
    pub position: [f32; 3],
    /// Surface normal [nx, ny, nz]
    pub normal: [f32; 3],
    /// Texture coordinate [u, v] with a top-left origin
    pub tex_coords: [f32; 2],
    /// Tangent along +u
    pub tangent: [f32; 3],
    /// Bitangent along +v
    pub bitangent: [f32; 3],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
        3 => Float32x3,
        4 => Float32x3
    ];

    /// Returns the vertex buffer layout for wgpu rendering.
    ///
    /// - Attribute 0: Position (Float32x3)
    /// - Attribute 1: Normal (Float32x3)
    /// - Attribute 2: Texture coordinate (Float32x2)
    /// - Attribute 3: Tangent (Float32x3)
    /// - Attribute 4: Bitangent (Float32x3)
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_stride() {
        assert_eq!(std::mem::size_of::<Vertex>(), 56);
        assert_eq!(Vertex::desc().array_stride, 56);
    }

    #[test]
    fn test_attribute_offsets_follow_field_order() {
        let offsets: Vec<u64> = Vertex::desc().attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 24, 32, 44]);
    }
}
