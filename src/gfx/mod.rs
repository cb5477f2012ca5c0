//! # Graphics Module
//!
//! Everything the viewer needs to put a model on screen.
//!
//! - **Camera** ([`camera`]) - First-person fly camera and its input controller
//! - **Geometry** ([`geometry`]) - Procedural meshes such as the lamp cube
//! - **Rendering** ([`rendering`]) - Shader programs, draw recording and the frame loop
//! - **Resources** ([`resources`]) - GPU textures and their fallbacks
//! - **Scene** ([`scene`]) - Meshes, models, asset import and lighting state
//!
//! ## Usage
//!
//! ```no_run
//! use model_viewer::gfx::scene::Model;
//!
//! // Loading needs a live device and queue, normally owned by the render engine:
//! // let model = Model::load("res/models/backpack/backpack.obj", device, queue);
//! ```

pub mod camera;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::FlyCamera;
pub use rendering::render_engine::RenderEngine;
