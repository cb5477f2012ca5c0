//! Error types for asset loading, textures, meshes and shader programs
//!
//! Only window/device creation is fatal; everything here is reported at the
//! call site and degrades locally.

use std::path::PathBuf;

use thiserror::Error;

/// Failures while reading a scene file into a [`SceneAsset`](crate::gfx::scene::asset::SceneAsset)
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("unsupported asset format '{extension}' for {path}")]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("failed to parse OBJ file {path}: {source}")]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("failed to parse glTF file {path}: {source}")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("scene in {path} is absent or incomplete: {reason}")]
    IncompleteScene { path: PathBuf, reason: String },
}

/// Failures while decoding or uploading a texture image
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to load image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("image {path} has {channels} channels, only 3 and 4 channel formats are allowed")]
    UnsupportedChannels { path: PathBuf, channels: u8 },
}

/// Mesh construction failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("index {index} at position {position} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        position: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("index count {0} is not a multiple of 3, only triangle lists are supported")]
    NotTriangulated(usize),
}

/// Model load failures surfaced by [`Model::try_load_with`](crate::gfx::scene::model::Model::try_load_with)
#[derive(Debug, Error)]
pub enum ModelError {
    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Shader program build failures
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("failed to read shader source {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to compile shader {path}: {message}")]
    Compile { path: PathBuf, message: String },

    #[error("failed to link program '{label}': {message}")]
    Link { label: String, message: String },
}
