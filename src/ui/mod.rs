//! # User Interface Module
//!
//! Dear ImGui overlay for the viewer.
//!
//! - [`UiManager`] - ImGui integration with winit and wgpu
//! - [`settings_panel`] - Light, material and shading controls
//!
//! The overlay sees window events before the camera. While ImGui wants the
//! mouse, cursor movement no longer turns the camera and scrolling no longer
//! zooms it.

pub mod manager;
pub mod panel;

// Re-export main types
pub use manager::UiManager;
pub use panel::settings_panel;
