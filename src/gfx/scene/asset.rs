//! CPU-side scene import for OBJ and glTF files
//!
//! Import only parses geometry and material texture references. Image files
//! are never decoded here; that happens when a [`Model`](super::model::Model)
//! resolves its textures.

use std::path::Path;

use percent_encoding::percent_decode_str;

use crate::error::AssetError;

use super::mesh::TextureKind;

/// One node of the imported hierarchy
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneNode {
    pub name: String,
    /// Indices into [`SceneAsset::meshes`]
    pub mesh_indices: Vec<usize>,
    pub children: Vec<SceneNode>,
}

/// Geometry of a single source mesh, before conversion to [`Vertex`](super::vertex::Vertex) records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub tex_coords: Option<Vec<[f32; 2]>>,
    /// xyz direction plus handedness sign in w
    pub tangents: Option<Vec<[f32; 4]>>,
    pub indices: Vec<u32>,
    /// Index into [`SceneAsset::materials`]
    pub material: Option<usize>,
}

/// Material texture references, relative to the asset's directory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceMaterial {
    pub name: String,
    pub textures: Vec<(TextureKind, String)>,
}

impl SourceMaterial {
    /// Relative texture names of one kind, in declaration order
    pub fn textures_of(&self, kind: TextureKind) -> impl Iterator<Item = &str> {
        self.textures
            .iter()
            .filter(move |(k, _)| *k == kind)
            .map(|(_, name)| name.as_str())
    }
}

/// Parsed scene: node tree plus the meshes and materials it references
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneAsset {
    pub root: Option<SceneNode>,
    pub meshes: Vec<SourceMesh>,
    pub materials: Vec<SourceMaterial>,
}

impl SceneAsset {
    /// Checks that the tree exists and only references known meshes
    pub fn validate(&self, path: &Path) -> Result<(), AssetError> {
        let root = self.root.as_ref().ok_or_else(|| AssetError::IncompleteScene {
            path: path.to_path_buf(),
            reason: "no scene root".to_string(),
        })?;

        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if let Some(&index) = node.mesh_indices.iter().find(|&&i| i >= self.meshes.len()) {
                return Err(AssetError::IncompleteScene {
                    path: path.to_path_buf(),
                    reason: format!(
                        "node '{}' references mesh {} but only {} exist",
                        node.name,
                        index,
                        self.meshes.len()
                    ),
                });
            }
            stack.extend(node.children.iter());
        }

        Ok(())
    }
}

/// Reads a scene file, dispatching on its extension
pub fn import(path: &Path) -> Result<SceneAsset, AssetError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let asset = match extension.as_str() {
        "obj" => import_obj(path)?,
        "gltf" | "glb" => import_gltf(path)?,
        _ => {
            return Err(AssetError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension,
            })
        }
    };

    asset.validate(path)?;
    Ok(asset)
}

fn import_obj(path: &Path) -> Result<SceneAsset, AssetError> {
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|source| AssetError::Obj {
        path: path.to_path_buf(),
        source,
    })?;

    let materials = materials.unwrap_or_else(|e| {
        log::warn!("No usable MTL for {}: {}", path.display(), e);
        Vec::new()
    });

    let materials = materials
        .iter()
        .map(|mtl| {
            let mut textures = Vec::new();
            if let Some(name) = &mtl.diffuse_texture {
                textures.push((TextureKind::Diffuse, name.clone()));
            }
            if let Some(name) = &mtl.specular_texture {
                textures.push((TextureKind::Specular, name.clone()));
            }
            if let Some(name) = &mtl.normal_texture {
                textures.push((TextureKind::Normal, name.clone()));
            } else if let Some(name) = mtl.unknown_param.get("norm") {
                textures.push((TextureKind::Normal, name.clone()));
            }
            if let Some(name) = mtl.unknown_param.get("disp") {
                textures.push((TextureKind::Height, name.clone()));
            }
            SourceMaterial {
                name: mtl.name.clone(),
                textures,
            }
        })
        .collect();

    let mut root = SceneNode {
        name: path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
        ..Default::default()
    };
    let mut meshes = Vec::with_capacity(models.len());

    for model in models {
        let mesh = model.mesh;
        let vertex_count = mesh.positions.len() / 3;

        let normals = (mesh.normals.len() == mesh.positions.len())
            .then(|| mesh.normals.chunks_exact(3).map(|n| [n[0], n[1], n[2]]).collect());
        let tex_coords = (mesh.texcoords.len() == vertex_count * 2).then(|| {
            mesh.texcoords
                .chunks_exact(2)
                .map(|t| [t[0], 1.0 - t[1]])
                .collect()
        });

        root.children.push(SceneNode {
            name: model.name.clone(),
            mesh_indices: vec![meshes.len()],
            children: Vec::new(),
        });
        meshes.push(SourceMesh {
            name: model.name,
            positions: mesh
                .positions
                .chunks_exact(3)
                .map(|p| [p[0], p[1], p[2]])
                .collect(),
            normals,
            tex_coords,
            tangents: None,
            indices: mesh.indices,
            material: mesh.material_id,
        });
    }

    Ok(SceneAsset {
        root: Some(root),
        meshes,
        materials,
    })
}

fn import_gltf(path: &Path) -> Result<SceneAsset, AssetError> {
    let gltf_err = |source| AssetError::Gltf {
        path: path.to_path_buf(),
        source,
    };

    let gltf::Gltf { document, blob } = gltf::Gltf::open(path).map_err(gltf_err)?;
    let buffers = gltf::import_buffers(&document, path.parent(), blob).map_err(gltf_err)?;

    let materials = document
        .materials()
        .map(|material| gltf_material(path, &material))
        .collect();

    // glTF meshes own several primitives; each primitive becomes one SourceMesh
    let mut meshes = Vec::new();
    let mut primitives_of_mesh = Vec::new();
    for mesh in document.meshes() {
        let mut indices_for_mesh = Vec::new();
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Skipping non-triangle primitive {} of mesh '{}' in {}",
                    primitive.index(),
                    mesh.name().unwrap_or_default(),
                    path.display()
                );
                continue;
            }

            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| &d.0[..]));
            let Some(positions) = reader.read_positions() else {
                log::warn!(
                    "Skipping primitive without positions in mesh '{}'",
                    mesh.name().unwrap_or_default()
                );
                continue;
            };
            let positions: Vec<[f32; 3]> = positions.collect();
            let indices = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };

            indices_for_mesh.push(meshes.len());
            meshes.push(SourceMesh {
                name: mesh.name().unwrap_or_default().to_string(),
                normals: reader.read_normals().map(|n| n.collect()),
                tex_coords: reader.read_tex_coords(0).map(|t| t.into_f32().collect()),
                tangents: reader.read_tangents().map(|t| t.collect()),
                positions,
                indices,
                material: primitive.material().index(),
            });
        }
        primitives_of_mesh.push(indices_for_mesh);
    }

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next());

    let root = scene.map(|scene| SceneNode {
        name: scene.name().unwrap_or_default().to_string(),
        mesh_indices: Vec::new(),
        children: scene
            .nodes()
            .map(|node| gltf_node(&node, &primitives_of_mesh))
            .collect(),
    });

    Ok(SceneAsset {
        root,
        meshes,
        materials,
    })
}

fn gltf_node(node: &gltf::Node, primitives_of_mesh: &[Vec<usize>]) -> SceneNode {
    SceneNode {
        name: node.name().unwrap_or_default().to_string(),
        mesh_indices: node
            .mesh()
            .and_then(|mesh| primitives_of_mesh.get(mesh.index()))
            .cloned()
            .unwrap_or_default(),
        children: node
            .children()
            .map(|child| gltf_node(&child, primitives_of_mesh))
            .collect(),
    }
}

fn gltf_material(path: &Path, material: &gltf::Material) -> SourceMaterial {
    let pbr = material.pbr_metallic_roughness();
    let slots = [
        (TextureKind::Diffuse, pbr.base_color_texture().map(|t| t.texture())),
        (
            TextureKind::Specular,
            pbr.metallic_roughness_texture().map(|t| t.texture()),
        ),
        (
            TextureKind::Normal,
            material.normal_texture().map(|t| t.texture()),
        ),
    ];

    let textures = slots
        .into_iter()
        .filter_map(|(kind, texture)| {
            let texture = texture?;
            match texture.source().source() {
                gltf::image::Source::Uri { uri, .. } if !uri.starts_with("data:") => {
                    match decode_uri(uri) {
                        Some(file) => Some((kind, file)),
                        None => {
                            log::warn!("Skipping {:?} image with malformed URI '{}'", kind, uri);
                            None
                        }
                    }
                }
                _ => {
                    log::warn!(
                        "Skipping embedded {:?} image of material '{}' in {}",
                        kind,
                        material.name().unwrap_or_default(),
                        path.display()
                    );
                    None
                }
            }
        })
        .collect();

    SourceMaterial {
        name: material.name().unwrap_or_default().to_string(),
        textures,
    }
}

/// Percent-decodes a relative image URI; `None` if it is not valid UTF-8
fn decode_uri(uri: &str) -> Option<String> {
    percent_decode_str(uri)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const TRIANGLE_OBJ: &str = "\
mtllib tri.mtl
o Tri
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 0.0 1.0
vn 0.0 0.0 1.0
usemtl painted
f 1/1/1 2/2/1 3/3/1
";

    const TRIANGLE_MTL: &str = "\
newmtl painted
map_Kd albedo.png
map_Ks shine.png
map_Bump bumps.png
disp height.png
";

    #[test]
    fn test_import_obj_builds_root_with_one_child_per_object() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tri.obj"), TRIANGLE_OBJ).unwrap();
        fs::write(dir.path().join("tri.mtl"), TRIANGLE_MTL).unwrap();

        let asset = import(&dir.path().join("tri.obj")).unwrap();
        let root = asset.root.as_ref().unwrap();

        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].mesh_indices, vec![0]);
        assert_eq!(asset.meshes[0].positions.len(), 3);
        assert_eq!(asset.meshes[0].indices, vec![0, 1, 2]);
        assert_eq!(asset.meshes[0].material, Some(0));
    }

    #[test]
    fn test_import_obj_flips_v_coordinate() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tri.obj"), TRIANGLE_OBJ).unwrap();
        fs::write(dir.path().join("tri.mtl"), TRIANGLE_MTL).unwrap();

        let asset = import(&dir.path().join("tri.obj")).unwrap();
        let uvs = asset.meshes[0].tex_coords.as_ref().unwrap();
        assert_eq!(uvs[0], [0.0, 1.0]);
        assert_eq!(uvs[2], [0.0, 0.0]);
    }

    #[test]
    fn test_import_obj_maps_material_textures_to_kinds() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tri.obj"), TRIANGLE_OBJ).unwrap();
        fs::write(dir.path().join("tri.mtl"), TRIANGLE_MTL).unwrap();

        let asset = import(&dir.path().join("tri.obj")).unwrap();
        let material = &asset.materials[0];
        assert_eq!(
            material.textures_of(TextureKind::Diffuse).collect::<Vec<_>>(),
            vec!["albedo.png"]
        );
        assert_eq!(
            material.textures_of(TextureKind::Specular).collect::<Vec<_>>(),
            vec!["shine.png"]
        );
        assert_eq!(
            material.textures_of(TextureKind::Normal).collect::<Vec<_>>(),
            vec!["bumps.png"]
        );
        assert_eq!(
            material.textures_of(TextureKind::Height).collect::<Vec<_>>(),
            vec!["height.png"]
        );
    }

    #[test]
    fn test_import_rejects_unknown_extension() {
        let err = import(Path::new("model.fbx")).unwrap_err();
        assert!(matches!(err, AssetError::UnsupportedFormat { ref extension, .. } if extension == "fbx"));
    }

    #[test]
    fn test_import_missing_obj_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = import(&dir.path().join("absent.obj")).unwrap_err();
        assert!(matches!(err, AssetError::Obj { .. }));
    }

    #[test]
    fn test_gltf_without_scene_is_incomplete() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.gltf");
        fs::write(&path, r#"{"asset":{"version":"2.0"}}"#).unwrap();

        let err = import(&path).unwrap_err();
        assert!(matches!(err, AssetError::IncompleteScene { .. }));
    }

    #[test]
    fn test_gltf_scene_without_nodes_has_empty_root() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bare.gltf");
        fs::write(
            &path,
            r#"{"asset":{"version":"2.0"},"scene":0,"scenes":[{"nodes":[]}]}"#,
        )
        .unwrap();

        let asset = import(&path).unwrap();
        let root = asset.root.unwrap();
        assert!(root.children.is_empty());
        assert!(asset.meshes.is_empty());
    }

    #[test]
    fn test_validate_rejects_dangling_mesh_index() {
        let asset = SceneAsset {
            root: Some(SceneNode {
                name: "root".into(),
                mesh_indices: Vec::new(),
                children: vec![SceneNode {
                    name: "child".into(),
                    mesh_indices: vec![3],
                    children: Vec::new(),
                }],
            }),
            ..Default::default()
        };

        let err = asset.validate(Path::new("x.gltf")).unwrap_err();
        assert!(matches!(err, AssetError::IncompleteScene { .. }));
    }

    #[test]
    fn test_decode_uri_handles_all_escapes() {
        assert_eq!(decode_uri("my%20tex.png").as_deref(), Some("my tex.png"));
        assert_eq!(decode_uri("a%23b%25.png").as_deref(), Some("a#b%.png"));
        assert_eq!(decode_uri("tex%C3%A9.png").as_deref(), Some("tex\u{e9}.png"));
        assert_eq!(decode_uri("plain/diffuse.jpg").as_deref(), Some("plain/diffuse.jpg"));
    }

    #[test]
    fn test_decode_uri_rejects_invalid_utf8() {
        assert_eq!(decode_uri("bad%FF.png"), None);
    }
}
