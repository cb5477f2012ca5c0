// src/gfx/rendering/mod.rs
//! Core rendering functionality
//!
//! Handles shader programs, mesh draw recording, per-frame state and frame rendering.

pub mod frame;
pub mod mesh_pass;
pub mod pipeline_manager;
pub mod render_engine;
pub mod shader_program;

// Re-export main types
pub use frame::{FrameContext, FrameTiming};
pub use mesh_pass::{DrawMesh, ProgramPass};
pub use pipeline_manager::{PipelineConfig, PipelineManager};
pub use render_engine::RenderEngine;
pub use shader_program::{SceneUniforms, ShaderProgram, TextureSlot};
