//! # Scene Module
//!
//! Everything the viewer draws, from import to GPU-ready meshes.
//!
//! - [`asset`] parses OBJ and glTF files into a node tree of source meshes
//! - [`Model`] walks that tree, uploads each distinct texture once and owns
//!   the resulting [`Mesh`]es
//! - [`Vertex`] is the interleaved vertex format shared by every mesh
//! - [`light`] holds the editable light, material and shading state
//!
//! ```no_run
//! use model_viewer::gfx::scene::Model;
//!
//! # fn load(device: &wgpu::Device, queue: &wgpu::Queue) {
//! let model = Model::load("res/models/scene.obj", device, queue);
//! log::info!("{} meshes", model.meshes().len());
//! # }
//! ```

pub mod asset;
pub mod light;
pub mod mesh;
pub mod model;
pub mod vertex;

pub use light::{LightProperties, MaterialSettings, ShaderVariant, ShaderVariantState};
pub use mesh::{Mesh, MeshTarget, Texture, TextureId, TextureKind};
pub use model::{Model, ModelStats, TextureUploader};
pub use vertex::Vertex;
