//! Viewer configuration
//!
//! Defaults reproduce the stock viewer: a 1600x900 window showing the antique
//! camera asset with Phong shading.

use std::path::{Path, PathBuf};

use crate::gfx::scene::light::ShaderVariant;

/// Environment variable that overrides [`ViewerConfig::asset_path`]
pub const ASSET_ENV_VAR: &str = "VIEWER_ASSET";

/// Locations of the WGSL sources the viewer builds its programs from
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderPaths {
    pub model_vertex: PathBuf,
    pub phong_fragment: PathBuf,
    pub cool_to_warm_fragment: PathBuf,
    pub lamp_vertex: PathBuf,
    pub lamp_fragment: PathBuf,
}

impl ShaderPaths {
    /// Standard file layout below `root`
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            model_vertex: root.join("default.vert.wgsl"),
            phong_fragment: root.join("lighting/phong.frag.wgsl"),
            cool_to_warm_fragment: root.join("lighting/cool_to_warm.frag.wgsl"),
            lamp_vertex: root.join("lighting/lamp.vert.wgsl"),
            lamp_fragment: root.join("lighting/lamp.frag.wgsl"),
        }
    }

    /// Fragment source used by the model program for `variant`
    pub fn fragment_for(&self, variant: ShaderVariant) -> &Path {
        match variant {
            ShaderVariant::Phong => &self.phong_fragment,
            ShaderVariant::CoolToWarm => &self.cool_to_warm_fragment,
        }
    }
}

impl Default for ShaderPaths {
    fn default() -> Self {
        Self::under(Path::new(env!("CARGO_MANIFEST_DIR")).join("shaders"))
    }
}

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub asset_path: PathBuf,
    pub shaders: ShaderPaths,
    pub model_scale: f32,
    pub lamp_scale: f32,
    pub clear_color: wgpu::Color,
    pub znear: f32,
    pub zfar: f32,
    pub look_sensitivity: f32,
    /// Use the camera zoom as the field of view; otherwise a fixed 45 degrees
    pub zoom_affects_projection: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "Model Viewer".to_string(),
            width: 1600,
            height: 900,
            asset_path: PathBuf::from("res/models/AntiqueCamera/glTF/AntiqueCamera.gltf"),
            shaders: ShaderPaths::default(),
            model_scale: 0.5,
            lamp_scale: 0.2,
            clear_color: wgpu::Color::BLACK,
            znear: 0.1,
            zfar: 100.0,
            look_sensitivity: 0.1,
            zoom_affects_projection: true,
        }
    }
}

impl ViewerConfig {
    /// Defaults with the asset path taken from `VIEWER_ASSET` when set
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(std::env::var_os(ASSET_ENV_VAR))
    }

    fn with_env_overrides(self, asset: Option<std::ffi::OsString>) -> Self {
        match asset {
            Some(path) if !path.is_empty() => {
                log::info!("Using asset from {}: {:?}", ASSET_ENV_VAR, path);
                self.with_asset_path(path)
            }
            _ => self,
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_owned();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_asset_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.asset_path = path.into();
        self
    }

    pub fn with_shaders(mut self, shaders: ShaderPaths) -> Self {
        self.shaders = shaders;
        self
    }

    pub fn with_clear_color(mut self, color: wgpu::Color) -> Self {
        self.clear_color = color;
        self
    }

    pub fn with_zoom_affects_projection(mut self, enabled: bool) -> Self {
        self.zoom_affects_projection = enabled;
        self
    }

    /// Vertical field of view in degrees for the given camera zoom
    pub fn field_of_view(&self, camera_zoom: f32) -> f32 {
        if self.zoom_affects_projection {
            camera_zoom
        } else {
            45.0
        }
    }
}
