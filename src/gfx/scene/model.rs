//! Loaded models: meshes plus a deduplicated texture arena

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use cgmath::{InnerSpace, Vector3};
use wgpu::{Device, Queue};

use crate::error::{ModelError, TextureError};
use crate::gfx::resources::texture_resource::{GpuTextureUploader, TextureResource};

use super::asset::{self, SceneAsset, SceneNode, SourceMesh};
use super::mesh::{Mesh, MeshTarget, Texture, TextureId, TextureKind};
use super::vertex::Vertex;

/// Creates GPU (or test) textures from image files
pub trait TextureUploader {
    type Texture;

    fn upload(&mut self, path: &Path, kind: TextureKind) -> Result<Self::Texture, TextureError>;
}

/// Counts shown in the settings overlay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModelStats {
    pub meshes: usize,
    pub vertices: usize,
    pub triangles: usize,
    pub textures: usize,
}

/// A scene file converted into drawable meshes.
///
/// Textures are uploaded once per distinct path and shared by every mesh
/// that references them.
pub struct Model<T = TextureResource> {
    directory: PathBuf,
    meshes: Vec<Mesh>,
    textures: Vec<Texture<T>>,
    texture_cache: HashMap<PathBuf, TextureId>,
}

impl<T> Model<T> {
    /// A model with no meshes; drawing it does nothing
    pub fn empty(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            meshes: Vec::new(),
            textures: Vec::new(),
            texture_cache: HashMap::new(),
        }
    }

    /// Loads `path`, logging failures and returning an empty model on error
    pub fn load_with<U>(path: impl AsRef<Path>, uploader: &mut U) -> Self
    where
        U: TextureUploader<Texture = T>,
    {
        let path = path.as_ref();
        match Self::try_load_with(path, uploader) {
            Ok(model) => model,
            Err(e) => {
                log::error!("Failed to load model {}: {}", path.display(), e);
                Self::empty(parent_dir(path))
            }
        }
    }

    /// Loads `path`, returning the import error instead of an empty model.
    ///
    /// Texture and mesh failures are still logged and skipped.
    pub fn try_load_with<U>(path: impl AsRef<Path>, uploader: &mut U) -> Result<Self, ModelError>
    where
        U: TextureUploader<Texture = T>,
    {
        let path = path.as_ref();
        let asset = asset::import(path)?;

        let mut model = Self::empty(parent_dir(path));
        if let Some(root) = &asset.root {
            model.process_node(root, &asset, uploader);
        }

        let stats = model.stats();
        log::info!(
            "Loaded {}: {} meshes, {} vertices, {} triangles, {} textures",
            path.display(),
            stats.meshes,
            stats.vertices,
            stats.triangles,
            stats.textures
        );

        Ok(model)
    }

    fn process_node<U>(&mut self, node: &SceneNode, asset: &SceneAsset, uploader: &mut U)
    where
        U: TextureUploader<Texture = T>,
    {
        for &index in &node.mesh_indices {
            let Some(source) = asset.meshes.get(index) else {
                continue;
            };
            if let Some(mesh) = self.process_mesh(source, asset, uploader) {
                self.meshes.push(mesh);
            }
        }

        for child in &node.children {
            self.process_node(child, asset, uploader);
        }
    }

    fn process_mesh<U>(
        &mut self,
        source: &SourceMesh,
        asset: &SceneAsset,
        uploader: &mut U,
    ) -> Option<Mesh>
    where
        U: TextureUploader<Texture = T>,
    {
        let mut vertices = build_vertices(source);
        if source.tangents.is_none() {
            Mesh::calculate_tangents(&mut vertices, &source.indices);
        }

        let mut texture_ids = Vec::new();
        if let Some(material) = source.material.and_then(|i| asset.materials.get(i)) {
            for kind in [
                TextureKind::Diffuse,
                TextureKind::Specular,
                TextureKind::Normal,
                TextureKind::Height,
            ] {
                for name in material.textures_of(kind) {
                    if let Some(id) = self.resolve_texture(name, kind, uploader) {
                        texture_ids.push(id);
                    }
                }
            }
        }

        match Mesh::new(vertices, source.indices.clone(), texture_ids) {
            Ok(mesh) => Some(mesh),
            Err(e) => {
                log::warn!("Skipping mesh '{}': {}", source.name, e);
                None
            }
        }
    }

    fn resolve_texture<U>(&mut self, name: &str, kind: TextureKind, uploader: &mut U) -> Option<TextureId>
    where
        U: TextureUploader<Texture = T>,
    {
        let path = self.directory.join(name);
        if let Some(&id) = self.texture_cache.get(&path) {
            return Some(id);
        }

        match uploader.upload(&path, kind) {
            Ok(handle) => {
                let id = TextureId(self.textures.len() as u32);
                self.textures.push(Texture {
                    id,
                    kind,
                    path: path.clone(),
                    handle,
                });
                self.texture_cache.insert(path, id);
                Some(id)
            }
            Err(e) => {
                log::warn!("Texture failed to load at path: {} ({})", path.display(), e);
                None
            }
        }
    }

    /// Draws every mesh in traversal order
    pub fn draw(&self, target: &mut impl MeshTarget<T>) {
        for mesh in &self.meshes {
            mesh.draw(&self.textures, target);
        }
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn textures(&self) -> &[Texture<T>] {
        &self.textures
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn stats(&self) -> ModelStats {
        ModelStats {
            meshes: self.meshes.len(),
            vertices: self.meshes.iter().map(|m| m.vertices().len()).sum(),
            triangles: self.meshes.iter().map(|m| m.indices().len() / 3).sum(),
            textures: self.textures.len(),
        }
    }
}

impl Model<TextureResource> {
    /// Loads `path` and uploads textures and mesh buffers to the GPU
    pub fn load(path: impl AsRef<Path>, device: &Device, queue: &Queue) -> Self {
        let mut uploader = GpuTextureUploader::new(device, queue);
        let mut model = Self::load_with(path, &mut uploader);
        for mesh in &mut model.meshes {
            mesh.init_gpu_resources(device);
        }
        model
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

/// Interleaves source attributes; missing normals and UVs become zero
fn build_vertices(source: &SourceMesh) -> Vec<Vertex> {
    source
        .positions
        .iter()
        .enumerate()
        .map(|(i, &position)| {
            let normal = source
                .normals
                .as_ref()
                .and_then(|n| n.get(i).copied())
                .unwrap_or_default();
            let tex_coords = source
                .tex_coords
                .as_ref()
                .and_then(|t| t.get(i).copied())
                .unwrap_or_default();

            let (tangent, bitangent) = match source.tangents.as_ref().and_then(|t| t.get(i)) {
                Some(&[x, y, z, w]) => {
                    let t = Vector3::new(x, y, z);
                    let b = Vector3::from(normal).cross(t) * w;
                    let b = if b.magnitude2() > 0.0 { b.normalize() } else { b };
                    (t.into(), b.into())
                }
                None => ([0.0; 3], [0.0; 3]),
            };

            Vertex {
                position,
                normal,
                tex_coords,
                tangent,
                bitangent,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::mesh::tests::RecordingTarget;
    use std::fs;

    /// Hands out the path as the texture payload and counts uploads
    #[derive(Default)]
    struct CountingUploader {
        uploads: Vec<PathBuf>,
    }

    impl TextureUploader for CountingUploader {
        type Texture = PathBuf;

        fn upload(&mut self, path: &Path, _kind: TextureKind) -> Result<PathBuf, TextureError> {
            if !path.exists() {
                return Err(TextureError::Decode {
                    path: path.to_path_buf(),
                    source: image::ImageError::IoError(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "missing",
                    )),
                });
            }
            self.uploads.push(path.to_path_buf());
            Ok(path.to_path_buf())
        }
    }

    const TWO_CUBES_OBJ: &str = "\
mtllib shared.mtl
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
v 1.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 0.0 1.0
vt 1.0 1.0
o First
usemtl wood
f 1/1 2/2 3/3
o Second
usemtl wood
f 2/2 4/4 3/3
o Third
usemtl metal
f 1/1 2/2 4/4
";

    const SHARED_MTL: &str = "\
newmtl wood
map_Kd wood.png
map_Ks shared_spec.png

newmtl metal
map_Kd metal.png
map_Ks shared_spec.png
";

    fn fixture(textures: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("scene.obj"), TWO_CUBES_OBJ).unwrap();
        fs::write(dir.path().join("shared.mtl"), SHARED_MTL).unwrap();
        for name in textures {
            fs::write(dir.path().join(name), b"png").unwrap();
        }
        dir
    }

    #[test]
    fn test_each_distinct_texture_path_uploads_once() {
        let dir = fixture(&["wood.png", "metal.png", "shared_spec.png"]);
        let mut uploader = CountingUploader::default();

        let model = Model::load_with(dir.path().join("scene.obj"), &mut uploader);

        // six references, three distinct paths
        assert_eq!(model.meshes().len(), 3);
        assert_eq!(uploader.uploads.len(), 3);
        assert_eq!(model.textures().len(), 3);
        assert_eq!(model.meshes()[0].textures(), model.meshes()[1].textures());
        assert_eq!(
            model.meshes()[0].textures()[1],
            model.meshes()[2].textures()[1]
        );
    }

    #[test]
    fn test_meshes_follow_depth_first_order() {
        let dir = fixture(&["wood.png", "metal.png", "shared_spec.png"]);
        let model = Model::load_with(dir.path().join("scene.obj"), &mut CountingUploader::default());

        let mut target = RecordingTarget::default();
        model.draw(&mut target);

        assert_eq!(target.draws, vec![3, 3, 3]);
        assert_eq!(
            target.samplers[..2],
            [
                ("material.texture_diffuse1".to_string(), 0),
                ("material.texture_specular1".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_missing_texture_is_skipped_and_load_continues() {
        let dir = fixture(&["metal.png", "shared_spec.png"]);
        let mut uploader = CountingUploader::default();

        let model = Model::load_with(dir.path().join("scene.obj"), &mut uploader);

        assert_eq!(model.meshes().len(), 3);
        assert_eq!(model.meshes()[0].textures().len(), 1);
        assert_eq!(model.meshes()[2].textures().len(), 2);

        let mut target = RecordingTarget::default();
        model.draw(&mut target);
        assert_eq!(target.draws.len(), 3);
    }

    #[test]
    fn test_failed_import_yields_empty_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nothing.obj");

        let model: Model<PathBuf> = Model::load_with(&path, &mut CountingUploader::default());
        assert!(model.meshes().is_empty());

        let mut target = RecordingTarget::default();
        model.draw(&mut target);
        assert!(target.draws.is_empty());

        assert!(Model::try_load_with(&path, &mut CountingUploader::default()).is_err());
    }

    #[test]
    fn test_gltf_scene_without_nodes_draws_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bare.gltf");
        fs::write(
            &path,
            r#"{"asset":{"version":"2.0"},"scene":0,"scenes":[{"nodes":[]}]}"#,
        )
        .unwrap();

        let model = Model::load_with(&path, &mut CountingUploader::default());
        let mut target = RecordingTarget::default();
        model.draw(&mut target);

        assert!(target.draws.is_empty());
        assert_eq!(model.stats(), ModelStats::default());
    }

    #[test]
    fn test_stats_sum_over_meshes() {
        let dir = fixture(&["wood.png", "metal.png", "shared_spec.png"]);
        let model = Model::load_with(dir.path().join("scene.obj"), &mut CountingUploader::default());

        let stats = model.stats();
        assert_eq!(stats.meshes, 3);
        assert_eq!(stats.triangles, 3);
        assert_eq!(stats.textures, 3);
    }

    #[test]
    fn test_missing_normals_default_to_zero() {
        let source = SourceMesh {
            positions: vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            indices: vec![0, 1, 2],
            ..Default::default()
        };
        let vertices = build_vertices(&source);
        assert!(vertices.iter().all(|v| v.normal == [0.0; 3]));
        assert!(vertices.iter().all(|v| v.tex_coords == [0.0; 2]));
    }
}
