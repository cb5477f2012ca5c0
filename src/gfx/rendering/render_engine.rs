//! WGPU-based rendering engine for the model viewer
//!
//! Owns the surface, device and shader programs, and records one frame:
//! the loaded model with the active lighting program, the lamp cube, then the
//! overlay supplied by the caller.

use std::sync::Arc;

use anyhow::{anyhow, Context};
use cgmath::{Matrix4, Point3};
use wgpu::TextureFormat;

use crate::config::{ShaderPaths, ViewerConfig};
use crate::gfx::{
    camera::camera_utils::projection_matrix,
    geometry::generate_cube,
    resources::texture_resource::{FallbackTextures, TextureResource},
    scene::{mesh::Mesh, Model, TextureKind},
};

use super::frame::FrameContext;
use super::mesh_pass::ProgramPass;
use super::pipeline_manager::{PipelineConfig, PipelineManager};
use super::shader_program::{ShaderProgram, TextureSlot};

pub const MODEL_PROGRAM: &str = "model";
pub const LAMP_PROGRAM: &str = "lamp";

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    format: TextureFormat,
    pub pipeline_manager: PipelineManager,
    fallbacks: FallbackTextures,
    lamp_mesh: Mesh,
    shaders: ShaderPaths,
    clear_color: wgpu::Color,
    model_scale: f32,
    lamp_scale: f32,
    znear: f32,
    zfar: f32,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// Fails if no adapter or device is available. Shader programs that fail
    /// to build are logged and left empty; their draws are skipped.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        viewer: &ViewerConfig,
    ) -> anyhow::Result<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("Failed to request adapter")?;

        log::info!("Using adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 8192,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to request a device")?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or_else(|| anyhow!("Surface reports no supported formats"))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");
        let fallbacks = FallbackTextures::new(&device, &queue);

        let mut lamp_mesh = generate_cube()
            .into_mesh()
            .context("Failed to build lamp cube")?;
        lamp_mesh.init_gpu_resources(&device);

        let device: Arc<wgpu::Device> = device.into();
        let queue: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device.clone());

        let shaders = viewer.shaders.clone();
        let _ = pipeline_manager.register_program(
            MODEL_PROGRAM,
            PipelineConfig::from_files(
                &shaders.model_vertex,
                shaders.fragment_for(Default::default()),
            )
            .with_label("Model")
            .with_color_format(format)
            .with_depth_format(TextureResource::DEPTH_FORMAT)
            .with_texture_slots(vec![
                TextureSlot::new("material.texture_diffuse1", TextureKind::Diffuse),
                TextureSlot::new("material.texture_specular1", TextureKind::Specular),
            ]),
        );
        let _ = pipeline_manager.register_program(
            LAMP_PROGRAM,
            PipelineConfig::from_files(&shaders.lamp_vertex, &shaders.lamp_fragment)
                .with_label("Lamp")
                .with_color_format(format)
                .with_depth_format(TextureResource::DEPTH_FORMAT),
        );

        Ok(RenderEngine {
            surface,
            device,
            queue,
            config,
            depth_texture,
            format,
            pipeline_manager,
            fallbacks,
            lamp_mesh,
            shaders,
            clear_color: viewer.clear_color,
            model_scale: viewer.model_scale,
            lamp_scale: viewer.lamp_scale,
            znear: viewer.znear,
            zfar: viewer.zfar,
        })
    }

    /// Records and presents one frame.
    ///
    /// `fovy` is the vertical field of view in degrees. The overlay callback
    /// runs after the scene pass on the same surface view. Returns false when
    /// no surface texture was available; the callback is not called then.
    pub fn render_frame<F>(
        &mut self,
        context: &mut FrameContext,
        model: &Model,
        fovy: f32,
        ui_callback: F,
    ) -> bool
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated; reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return false;
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::debug!("Surface timed out; skipping frame");
                return false;
            }
            Err(e) => {
                log::error!("Failed to acquire surface texture: {}", e);
                return false;
            }
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        if let Some(variant) = context.shader.take_change() {
            log::info!("Switching model shading to {}", variant.name());
            let fragment = self.shaders.fragment_for(variant).to_path_buf();
            let _ = self
                .pipeline_manager
                .swap_fragment_shader(MODEL_PROGRAM, &fragment);
        }

        let view = context.camera.view_matrix();
        let projection = projection_matrix(fovy, self.aspect(), self.znear, self.zfar);
        let camera_position = context.camera.camera.position;
        let light = context.light;

        let model_matrix = Matrix4::from_scale(self.model_scale);
        let lamp_matrix = Matrix4::from_translation(light.position_vector())
            * Matrix4::from_scale(self.lamp_scale);

        for (name, matrix) in [(MODEL_PROGRAM, model_matrix), (LAMP_PROGRAM, lamp_matrix)] {
            if let Some(program) = self.pipeline_manager.program_mut(name) {
                set_frame_uniforms(program, context, camera_position, &view, &projection);
                program.set_mat4("u_Model", &matrix);
                program.flush(&self.queue);
            }
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(program) = self.pipeline_manager.program_mut(MODEL_PROGRAM) {
                let mut pass =
                    ProgramPass::begin(&mut render_pass, program, &self.device, &self.fallbacks);
                model.draw(&mut pass);
            }

            if let Some(program) = self.pipeline_manager.program_mut(LAMP_PROGRAM) {
                let mut pass =
                    ProgramPass::begin(&mut render_pass, program, &self.device, &self.fallbacks);
                self.lamp_mesh.draw::<TextureResource>(&[], &mut pass);
            }
        }

        ui_callback(&self.device, &self.queue, &mut encoder, &surface_texture_view);

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        true
    }

    /// Resizes the surface and recreates the depth buffer
    ///
    /// Zero-sized requests (minimised windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);

        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }

    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

/// Uniforms shared by the model and lamp programs
fn set_frame_uniforms(
    program: &mut ShaderProgram,
    context: &FrameContext,
    camera_position: Point3<f32>,
    view: &Matrix4<f32>,
    projection: &Matrix4<f32>,
) {
    let light = &context.light;
    program.set_vec3("light.position", light.position);
    program.set_vec3("light.ambient", light.ambient);
    program.set_vec3("light.diffuse", light.diffuse);
    program.set_vec3("light.specular", light.specular);
    program.set_vec3("u_CameraPos", [camera_position.x, camera_position.y, camera_position.z]);
    program.set_float("u_Shininess", context.material.shininess);
    program.set_mat4("u_View", view);
    program.set_mat4("u_Projection", projection);
}
