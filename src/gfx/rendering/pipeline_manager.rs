//! Shader program management for wgpu
//!
//! Programs are registered by name from a [`PipelineConfig`] and built
//! immediately. A program that fails to build leaves its slot empty; the
//! renderer skips draws for empty slots instead of substituting a fallback.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use wgpu::{Device, TextureFormat};

use crate::error::ShaderError;

use super::shader_program::{ShaderProgram, TextureSlot};

/// Configuration for building a shader program
///
/// Names the vertex and fragment source files and the render state the
/// resulting pipeline uses.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label: String,
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
    pub color_format: TextureFormat,
    pub depth_format: Option<TextureFormat>,
    pub texture_slots: Vec<TextureSlot>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            label: "Default Program".to_string(),
            vertex_shader: PathBuf::from("shaders/default.vert.wgsl"),
            fragment_shader: PathBuf::from("shaders/lighting/phong.frag.wgsl"),
            color_format: TextureFormat::Bgra8Unorm,
            depth_format: None,
            texture_slots: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// Creates a config from a vertex and a fragment source file
    pub fn from_files(vertex: impl Into<PathBuf>, fragment: impl Into<PathBuf>) -> Self {
        Self {
            vertex_shader: vertex.into(),
            fragment_shader: fragment.into(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_owned();
        self
    }

    pub fn with_fragment_shader(mut self, path: impl Into<PathBuf>) -> Self {
        self.fragment_shader = path.into();
        self
    }

    pub fn with_color_format(mut self, format: TextureFormat) -> Self {
        self.color_format = format;
        self
    }

    /// Enables depth testing against a target of `format`
    pub fn with_depth_format(mut self, format: TextureFormat) -> Self {
        self.depth_format = Some(format);
        self
    }

    /// Declares the sampler slots bound in group 1, in binding order
    pub fn with_texture_slots(mut self, slots: Vec<TextureSlot>) -> Self {
        self.texture_slots = slots;
        self
    }
}

/// Owns the named shader programs used by the renderer
pub struct PipelineManager {
    device: Arc<Device>,
    configs: HashMap<String, PipelineConfig>,
    programs: HashMap<String, ShaderProgram>,
}

impl PipelineManager {
    pub fn new(device: Arc<Device>) -> Self {
        Self {
            device,
            configs: HashMap::new(),
            programs: HashMap::new(),
        }
    }

    /// Registers and builds a program.
    ///
    /// On failure the error is logged and returned; the slot stays empty.
    pub fn register_program(&mut self, name: &str, config: PipelineConfig) -> Result<(), ShaderError> {
        self.configs.insert(name.to_string(), config);
        self.rebuild(name)
    }

    /// Replaces a program with one built from a different fragment file.
    ///
    /// The previous program is dropped even when the new one fails to build.
    pub fn swap_fragment_shader(&mut self, name: &str, fragment: &Path) -> Result<(), ShaderError> {
        if let Some(config) = self.configs.get_mut(name) {
            config.fragment_shader = fragment.to_path_buf();
        }
        self.rebuild(name)
    }

    fn rebuild(&mut self, name: &str) -> Result<(), ShaderError> {
        self.programs.remove(name);

        let Some(config) = self.configs.get(name) else {
            log::warn!("No program registered as '{}'", name);
            return Ok(());
        };

        match ShaderProgram::new(&self.device, config) {
            Ok(program) => {
                self.programs.insert(name.to_string(), program);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to build program '{}': {}", name, e);
                Err(e)
            }
        }
    }

    /// The built program, or `None` if it failed to build
    pub fn program_mut(&mut self, name: &str) -> Option<&mut ShaderProgram> {
        self.programs.get_mut(name)
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::mesh::TextureKind;

    #[test]
    fn test_config_builder_overrides_defaults() {
        let config = PipelineConfig::from_files("a.vert.wgsl", "b.frag.wgsl")
            .with_label("Model")
            .with_depth_format(TextureFormat::Depth32Float)
            .with_texture_slots(vec![TextureSlot::new(
                "material.texture_diffuse1",
                TextureKind::Diffuse,
            )])
            .with_fragment_shader("c.frag.wgsl");

        assert_eq!(config.label, "Model");
        assert_eq!(config.vertex_shader, PathBuf::from("a.vert.wgsl"));
        assert_eq!(config.fragment_shader, PathBuf::from("c.frag.wgsl"));
        assert_eq!(config.depth_format, Some(TextureFormat::Depth32Float));
        assert_eq!(config.texture_slots.len(), 1);
    }
}
