// src/lib.rs
//! Model Viewer
//!
//! An interactive 3D model viewer built on wgpu and winit: loads an OBJ or
//! glTF scene, lights it with a single point light and lets you fly around it.

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod ui;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::ViewerApp;
pub use config::ViewerConfig;
