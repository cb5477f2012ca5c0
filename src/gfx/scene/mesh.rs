//! Drawable meshes and the textures they reference
//!
//! A [`Mesh`] owns its geometry and (once uploaded) its GPU buffers. Textures
//! live in the owning model's arena; meshes only keep [`TextureId`]s into it.

use std::path::PathBuf;

use cgmath::{InnerSpace, Vector2, Vector3, Zero};
use wgpu::Device;

use crate::error::MeshError;

use super::vertex::Vertex;

/// Semantic role of a texture within a material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Diffuse,
    Specular,
    Normal,
    Height,
}

impl TextureKind {
    /// Uniform name stem used by the fragment shaders
    pub fn uniform_stem(self) -> &'static str {
        match self {
            TextureKind::Diffuse => "texture_diffuse",
            TextureKind::Specular => "texture_specular",
            TextureKind::Normal => "texture_normal",
            TextureKind::Height => "texture_height",
        }
    }
}

/// Index of a texture inside a model's texture arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

impl TextureId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// An uploaded texture together with its semantic kind and source path.
///
/// `T` is the GPU payload; the viewer uses
/// [`TextureResource`](crate::gfx::resources::TextureResource).
#[derive(Debug, Clone)]
pub struct Texture<T> {
    pub id: TextureId,
    pub kind: TextureKind,
    pub path: PathBuf,
    pub handle: T,
}

/// Receiver of mesh draw commands.
///
/// Implemented by the wgpu program pass and by test recorders, so both walk
/// exactly the same binding sequence.
pub trait MeshTarget<T> {
    /// Points the sampler uniform `name` at texture unit `unit`
    fn set_sampler(&mut self, name: &str, unit: u32);
    /// Binds `texture` to texture unit `unit`
    fn bind_texture(&mut self, unit: u32, texture: &Texture<T>);
    /// Issues an indexed triangle-list draw of `index_count` indices
    fn draw_indexed(&mut self, mesh: &Mesh, index_count: u32);
}

pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    textures: Vec<TextureId>,
    pub(crate) vertex_buffer: Option<wgpu::Buffer>,
    pub(crate) index_buffer: Option<wgpu::Buffer>,
    index_count: u32,
}

impl Mesh {
    /// Creates a mesh from finalized geometry and texture references.
    ///
    /// Fails if any index is outside the vertex range or the index list is
    /// not a triangle list.
    pub fn new(
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        textures: Vec<TextureId>,
    ) -> Result<Self, MeshError> {
        if indices.len() % 3 != 0 {
            return Err(MeshError::NotTriangulated(indices.len()));
        }

        if let Some((position, &index)) = indices
            .iter()
            .enumerate()
            .find(|(_, &i)| i as usize >= vertices.len())
        {
            return Err(MeshError::IndexOutOfRange {
                position,
                index,
                vertex_count: vertices.len(),
            });
        }

        let index_count = indices.len() as u32;

        Ok(Self {
            vertices,
            indices,
            textures,
            vertex_buffer: None,
            index_buffer: None,
            index_count,
        })
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn textures(&self) -> &[TextureId] {
        &self.textures
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn is_uploaded(&self) -> bool {
        self.vertex_buffer.is_some() && self.index_buffer.is_some()
    }

    /// Uploads vertex and index data into GPU buffers.
    ///
    /// Runs once; later calls keep the existing buffers.
    pub fn init_gpu_resources(&mut self, device: &Device) {
        if self.is_uploaded() {
            return;
        }

        let vertex_buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Vertex Buffer"),
                contents: bytemuck::cast_slice(&self.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            },
        );

        let index_buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Index Buffer"),
                contents: bytemuck::cast_slice(&self.indices),
                usage: wgpu::BufferUsages::INDEX,
            },
        );

        self.vertex_buffer = Some(vertex_buffer);
        self.index_buffer = Some(index_buffer);
    }

    /// Sampler uniform names for the given texture kinds, in binding order.
    ///
    /// Ordinals are 1-based and counted per kind, so two diffuse maps and one
    /// specular map yield `texture_diffuse1`, `texture_diffuse2`,
    /// `texture_specular1`.
    pub fn sampler_names(kinds: impl IntoIterator<Item = TextureKind>) -> Vec<String> {
        let mut counters = [0u32; 4];
        kinds
            .into_iter()
            .map(|kind| {
                let slot = match kind {
                    TextureKind::Diffuse => 0,
                    TextureKind::Specular => 1,
                    TextureKind::Normal => 2,
                    TextureKind::Height => 3,
                };
                counters[slot] += 1;
                format!("material.{}{}", kind.uniform_stem(), counters[slot])
            })
            .collect()
    }

    /// Binds this mesh's textures and issues its draw.
    ///
    /// `textures` is the owning model's arena.
    pub fn draw<T>(&self, textures: &[Texture<T>], target: &mut impl MeshTarget<T>) {
        let bound: Vec<&Texture<T>> = self
            .textures
            .iter()
            .filter_map(|id| {
                let texture = textures.get(id.index());
                if texture.is_none() {
                    log::debug!("mesh references unknown texture {:?}", id);
                }
                texture
            })
            .collect();

        let names = Self::sampler_names(bound.iter().map(|t| t.kind));
        for (unit, (texture, name)) in bound.iter().zip(&names).enumerate() {
            target.set_sampler(name, unit as u32);
            target.bind_texture(unit as u32, texture);
        }

        target.draw_indexed(self, self.index_count);
    }

    /// Fills tangent and bitangent vectors from positions and UVs.
    ///
    /// Contributions of every triangle are accumulated per vertex and
    /// normalized; degenerate UV mappings leave the vectors at zero.
    pub fn calculate_tangents(vertices: &mut [Vertex], indices: &[u32]) {
        let mut tangents = vec![Vector3::zero(); vertices.len()];
        let mut bitangents = vec![Vector3::zero(); vertices.len()];

        for triangle in indices.chunks_exact(3) {
            let [i0, i1, i2] = [
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            ];
            if i0 >= vertices.len() || i1 >= vertices.len() || i2 >= vertices.len() {
                continue;
            }

            let p0 = Vector3::from(vertices[i0].position);
            let p1 = Vector3::from(vertices[i1].position);
            let p2 = Vector3::from(vertices[i2].position);
            let uv0 = Vector2::from(vertices[i0].tex_coords);
            let uv1 = Vector2::from(vertices[i1].tex_coords);
            let uv2 = Vector2::from(vertices[i2].tex_coords);

            let edge1 = p1 - p0;
            let edge2 = p2 - p0;
            let duv1 = uv1 - uv0;
            let duv2 = uv2 - uv0;

            let det = duv1.x * duv2.y - duv2.x * duv1.y;
            if det.abs() < f32::EPSILON {
                continue;
            }
            let r = 1.0 / det;

            let tangent = (edge1 * duv2.y - edge2 * duv1.y) * r;
            let bitangent = (edge2 * duv1.x - edge1 * duv2.x) * r;

            for &i in &[i0, i1, i2] {
                tangents[i] += tangent;
                bitangents[i] += bitangent;
            }
        }

        for (vertex, (t, b)) in vertices.iter_mut().zip(tangents.into_iter().zip(bitangents)) {
            if t.magnitude2() > 0.0 {
                vertex.tangent = t.normalize().into();
            }
            if b.magnitude2() > 0.0 {
                vertex.bitangent = b.normalize().into();
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Records every call a mesh makes against its target
    #[derive(Default)]
    pub(crate) struct RecordingTarget {
        pub samplers: Vec<(String, u32)>,
        pub bound: Vec<(u32, TextureId)>,
        pub draws: Vec<u32>,
    }

    impl<T> MeshTarget<T> for RecordingTarget {
        fn set_sampler(&mut self, name: &str, unit: u32) {
            self.samplers.push((name.to_string(), unit));
        }

        fn bind_texture(&mut self, unit: u32, texture: &Texture<T>) {
            self.bound.push((unit, texture.id));
        }

        fn draw_indexed(&mut self, _mesh: &Mesh, index_count: u32) {
            self.draws.push(index_count);
        }
    }

    fn quad() -> (Vec<Vertex>, Vec<u32>) {
        let corners = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        let vertices = corners
            .iter()
            .map(|&[x, y]| Vertex {
                position: [x, y, 0.0],
                normal: [0.0, 0.0, 1.0],
                tex_coords: [x, y],
                ..Default::default()
            })
            .collect();
        (vertices, vec![0, 1, 2, 2, 3, 0])
    }

    fn texture(id: u32, kind: TextureKind) -> Texture<()> {
        Texture {
            id: TextureId(id),
            kind,
            path: PathBuf::from(format!("tex{}.png", id)),
            handle: (),
        }
    }

    #[test]
    fn test_sampler_names_count_per_kind() {
        let names = Mesh::sampler_names([
            TextureKind::Diffuse,
            TextureKind::Specular,
            TextureKind::Diffuse,
        ]);
        assert_eq!(
            names,
            vec![
                "material.texture_diffuse1",
                "material.texture_specular1",
                "material.texture_diffuse2",
            ]
        );
    }

    #[test]
    fn test_draw_binds_units_in_order_and_draws_index_count() {
        let (vertices, indices) = quad();
        let arena = vec![
            texture(0, TextureKind::Diffuse),
            texture(1, TextureKind::Diffuse),
            texture(2, TextureKind::Specular),
        ];
        let mesh = Mesh::new(vertices, indices, vec![TextureId(0), TextureId(1), TextureId(2)])
            .unwrap();

        let mut target = RecordingTarget::default();
        mesh.draw(&arena, &mut target);

        assert_eq!(
            target.samplers,
            vec![
                ("material.texture_diffuse1".to_string(), 0),
                ("material.texture_diffuse2".to_string(), 1),
                ("material.texture_specular1".to_string(), 2),
            ]
        );
        assert_eq!(
            target.bound,
            vec![(0, TextureId(0)), (1, TextureId(1)), (2, TextureId(2))]
        );
        assert_eq!(target.draws, vec![6]);
        assert_eq!(mesh.index_count(), 6);
    }

    #[test]
    fn test_draw_without_textures_still_draws() {
        let (vertices, indices) = quad();
        let mesh = Mesh::new(vertices, indices, Vec::new()).unwrap();

        let mut target = RecordingTarget::default();
        mesh.draw::<()>(&[], &mut target);

        assert!(target.samplers.is_empty());
        assert_eq!(target.draws, vec![6]);
    }

    #[test]
    fn test_new_rejects_out_of_range_index() {
        let (vertices, _) = quad();
        let err = Mesh::new(vertices, vec![0, 1, 4], Vec::new()).err();
        assert_eq!(
            err,
            Some(MeshError::IndexOutOfRange {
                position: 2,
                index: 4,
                vertex_count: 4
            })
        );
    }

    #[test]
    fn test_new_rejects_non_triangle_lists() {
        let (vertices, _) = quad();
        let err = Mesh::new(vertices, vec![0, 1], Vec::new()).err();
        assert_eq!(err, Some(MeshError::NotTriangulated(2)));
    }

    #[test]
    fn test_tangents_follow_uv_axes() {
        let (mut vertices, indices) = quad();
        Mesh::calculate_tangents(&mut vertices, &indices);

        for vertex in &vertices {
            assert!((vertex.tangent[0] - 1.0).abs() < 1e-5);
            assert!((vertex.bitangent[1] - 1.0).abs() < 1e-5);
        }
    }
}
