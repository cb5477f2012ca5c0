//! GPU resource management
//!
//! Textures decoded from disk, depth buffers and fallback textures.

pub mod texture_resource;

pub use texture_resource::{FallbackTextures, GpuTextureUploader, TextureResource};
