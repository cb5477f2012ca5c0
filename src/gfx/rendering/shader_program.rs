//! Shader programs with a named uniform block and named texture samplers
//!
//! A program pairs a vertex and a fragment WGSL file into one render pipeline.
//! Uniforms are addressed by name (`u_View`, `light.diffuse`, ...) and staged
//! on the CPU; [`ShaderProgram::flush`] pushes the block to the GPU.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use cgmath::Matrix4;

use crate::error::ShaderError;
use crate::gfx::resources::texture_resource::TextureResource;
use crate::gfx::scene::mesh::{TextureId, TextureKind};
use crate::gfx::scene::vertex::Vertex;
use crate::wgpu_utils::{
    binding_types, BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc,
    UniformBuffer,
};

use super::pipeline_manager::PipelineConfig;

/// GPU layout of the uniform block shared by every program.
///
/// Matches the WGSL `SceneUniforms` struct, including vec3 padding.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniforms {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    pub shininess: f32,
    pub light_position: [f32; 3],
    pub _padding0: f32,
    pub light_ambient: [f32; 3],
    pub _padding1: f32,
    pub light_diffuse: [f32; 3],
    pub _padding2: f32,
    pub light_specular: [f32; 3],
    pub _padding3: f32,
}

impl Default for SceneUniforms {
    fn default() -> Self {
        let identity: [[f32; 4]; 4] = Matrix4::<f32>::from_scale(1.0).into();
        Self {
            model: identity,
            view: identity,
            projection: identity,
            camera_pos: [0.0; 3],
            shininess: 32.0,
            light_position: [0.0; 3],
            _padding0: 0.0,
            light_ambient: [0.0; 3],
            _padding1: 0.0,
            light_diffuse: [0.0; 3],
            _padding2: 0.0,
            light_specular: [0.0; 3],
            _padding3: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformType {
    Float,
    Vec3,
    Mat4,
}

/// Type and byte offset of a named uniform inside [`SceneUniforms`]
pub fn uniform_location(name: &str) -> Option<(UniformType, usize)> {
    let location = match name {
        "u_Model" => (UniformType::Mat4, 0),
        "u_View" => (UniformType::Mat4, 64),
        "u_Projection" => (UniformType::Mat4, 128),
        "u_CameraPos" => (UniformType::Vec3, 192),
        "u_Shininess" => (UniformType::Float, 204),
        "light.position" => (UniformType::Vec3, 208),
        "light.ambient" => (UniformType::Vec3, 224),
        "light.diffuse" => (UniformType::Vec3, 240),
        "light.specular" => (UniformType::Vec3, 256),
        _ => return None,
    };
    Some(location)
}

/// CPU copy of the uniform block, written by name
#[derive(Debug, Default)]
pub struct UniformBlock {
    values: SceneUniforms,
    warned: HashSet<String>,
}

impl UniformBlock {
    pub fn values(&self) -> &SceneUniforms {
        &self.values
    }

    pub fn set_float(&mut self, name: &str, value: f32) {
        self.write(name, UniformType::Float, bytemuck::bytes_of(&value));
    }

    pub fn set_vec3(&mut self, name: &str, value: impl Into<[f32; 3]>) {
        let value: [f32; 3] = value.into();
        self.write(name, UniformType::Vec3, bytemuck::bytes_of(&value));
    }

    pub fn set_mat4(&mut self, name: &str, value: &Matrix4<f32>) {
        let value: [[f32; 4]; 4] = (*value).into();
        self.write(name, UniformType::Mat4, bytemuck::bytes_of(&value));
    }

    fn write(&mut self, name: &str, ty: UniformType, bytes: &[u8]) {
        match uniform_location(name) {
            Some((declared, offset)) if declared == ty => {
                bytemuck::bytes_of_mut(&mut self.values)[offset..offset + bytes.len()]
                    .copy_from_slice(bytes);
            }
            Some((declared, _)) => {
                if self.warned.insert(name.to_string()) {
                    log::warn!("Uniform '{}' is {:?}, not {:?}; ignoring", name, declared, ty);
                }
            }
            None => {
                if self.warned.insert(name.to_string()) {
                    log::warn!("Uniform '{}' is not declared by the program; ignoring", name);
                }
            }
        }
    }
}

/// A sampler declared by a program's fragment shader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureSlot {
    pub name: String,
    pub kind: TextureKind,
}

impl TextureSlot {
    pub fn new(name: &str, kind: TextureKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
        }
    }
}

/// Maps declared sampler names to the texture unit assigned for the next draw
#[derive(Debug, Default)]
pub struct SamplerTable {
    slots: Vec<TextureSlot>,
    units: Vec<Option<u32>>,
    warned: HashSet<String>,
}

impl SamplerTable {
    pub fn new(slots: Vec<TextureSlot>) -> Self {
        let units = vec![None; slots.len()];
        Self {
            slots,
            units,
            warned: HashSet::new(),
        }
    }

    /// Assigns `unit` to the sampler called `name`; undeclared names are ignored
    pub fn set_sampler(&mut self, name: &str, unit: u32) -> bool {
        match self.slots.iter().position(|slot| slot.name == name) {
            Some(index) => {
                self.units[index] = Some(unit);
                true
            }
            None => {
                if self.warned.insert(name.to_string()) {
                    log::warn!("Sampler '{}' is not declared by the program; ignoring", name);
                }
                false
            }
        }
    }

    pub fn slots(&self) -> &[TextureSlot] {
        &self.slots
    }

    /// Declared slots with the unit each one samples from
    pub fn assignments(&self) -> impl Iterator<Item = (&TextureSlot, Option<u32>)> {
        self.slots.iter().zip(self.units.iter().copied())
    }

    pub fn reset(&mut self) {
        self.units.iter_mut().for_each(|unit| *unit = None);
    }
}

/// A linked vertex + fragment program and its bindings.
///
/// Group 0 holds the uniform block. Group 1, present when the program
/// declares samplers, holds one texture per slot followed by a shared sampler.
pub struct ShaderProgram {
    label: String,
    pipeline: wgpu::RenderPipeline,
    uniforms: UniformBlock,
    uniform_buffer: UniformBuffer<SceneUniforms>,
    uniform_bind_group: wgpu::BindGroup,
    samplers: SamplerTable,
    texture_layout: Option<BindGroupLayoutWithDesc>,
    texture_bind_groups: HashMap<Vec<Option<TextureId>>, wgpu::BindGroup>,
}

impl ShaderProgram {
    /// Reads, compiles and links the program described by `config`
    pub fn new(device: &wgpu::Device, config: &PipelineConfig) -> Result<Self, ShaderError> {
        let vertex = compile_module(device, &config.vertex_shader)?;
        let fragment = compile_module(device, &config.fragment_shader)?;

        let uniform_buffer = UniformBuffer::<SceneUniforms>::new(device);
        let uniform_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, &format!("{} Uniform Layout", config.label));
        let uniform_bind_group = BindGroupBuilder::new(&uniform_layout)
            .resource(uniform_buffer.binding_resource())
            .create(device, &format!("{} Uniform Bind Group", config.label));

        let texture_layout = (!config.texture_slots.is_empty()).then(|| {
            config
                .texture_slots
                .iter()
                .fold(BindGroupLayoutBuilder::new(), |builder, _| {
                    builder.next_binding_fragment(binding_types::texture_2d())
                })
                .next_binding_fragment(binding_types::sampler(
                    wgpu::SamplerBindingType::Filtering,
                ))
                .create(device, &format!("{} Texture Layout", config.label))
        });

        let mut layouts = vec![&uniform_layout.layout];
        if let Some(texture_layout) = &texture_layout {
            layouts.push(&texture_layout.layout);
        }

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{} Layout", config.label)),
            bind_group_layouts: &layouts,
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&config.label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: config.depth_format.map(|format| wgpu::DepthStencilState {
                format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(ShaderError::Link {
                label: config.label.clone(),
                message: error.to_string(),
            });
        }

        log::info!(
            "Built program '{}' from {} + {}",
            config.label,
            config.vertex_shader.display(),
            config.fragment_shader.display()
        );

        Ok(Self {
            label: config.label.clone(),
            pipeline,
            uniforms: UniformBlock::default(),
            uniform_buffer,
            uniform_bind_group,
            samplers: SamplerTable::new(config.texture_slots.clone()),
            texture_layout,
            texture_bind_groups: HashMap::new(),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_float(&mut self, name: &str, value: f32) {
        self.uniforms.set_float(name, value);
    }

    pub fn set_vec3(&mut self, name: &str, value: impl Into<[f32; 3]>) {
        self.uniforms.set_vec3(name, value);
    }

    pub fn set_mat4(&mut self, name: &str, value: &Matrix4<f32>) {
        self.uniforms.set_mat4(name, value);
    }

    pub fn set_sampler(&mut self, name: &str, unit: u32) -> bool {
        self.samplers.set_sampler(name, unit)
    }

    pub fn uniforms(&self) -> &UniformBlock {
        &self.uniforms
    }

    pub fn samplers(&self) -> &SamplerTable {
        &self.samplers
    }

    pub fn reset_samplers(&mut self) {
        self.samplers.reset();
    }

    pub fn has_textures(&self) -> bool {
        self.texture_layout.is_some()
    }

    /// Uploads the staged uniform block if it changed
    pub fn flush(&mut self, queue: &wgpu::Queue) {
        self.uniform_buffer.update_content(queue, self.uniforms.values());
    }

    /// Sets the pipeline and the uniform bind group on `pass`
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.uniform_bind_group, &[]);
    }

    /// Bind group for one texture per declared slot, cached by texture ids.
    ///
    /// `key` identifies the textures (`None` for a fallback) and `textures`
    /// supplies the matching resources in slot order.
    pub fn texture_bind_group(
        &mut self,
        device: &wgpu::Device,
        key: Vec<Option<TextureId>>,
        textures: &[&TextureResource],
    ) -> Option<&wgpu::BindGroup> {
        let layout = self.texture_layout.as_ref()?;
        let label = &self.label;

        Some(self.texture_bind_groups.entry(key).or_insert_with(|| {
            let builder = textures
                .iter()
                .fold(BindGroupBuilder::new(layout), |builder, texture| {
                    builder.texture(&texture.view)
                });
            let builder = match textures.first() {
                Some(texture) => builder.sampler(&texture.sampler),
                None => builder,
            };
            builder.create(device, &format!("{} Texture Bind Group", label))
        }))
    }
}

fn compile_module(device: &wgpu::Device, path: &Path) -> Result<wgpu::ShaderModule, ShaderError> {
    let source = std::fs::read_to_string(path).map_err(|source| ShaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&path.display().to_string()),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    match pollster::block_on(device.pop_error_scope()) {
        Some(error) => Err(ShaderError::Compile {
            path: path.to_path_buf(),
            message: error.to_string(),
        }),
        None => Ok(module),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    #[test]
    fn test_uniform_block_size_matches_shader_layout() {
        assert_eq!(std::mem::size_of::<SceneUniforms>(), 272);
    }

    #[test]
    fn test_named_uniforms_land_at_their_offsets() {
        let mut block = UniformBlock::default();
        block.set_mat4("u_View", &Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0)));
        block.set_vec3("u_CameraPos", Vector3::new(4.0, 5.0, 6.0));
        block.set_float("u_Shininess", 64.0);
        block.set_vec3("light.diffuse", [0.5, 0.25, 0.125]);

        let values = block.values();
        assert_eq!(values.view[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(values.camera_pos, [4.0, 5.0, 6.0]);
        assert_eq!(values.shininess, 64.0);
        assert_eq!(values.light_diffuse, [0.5, 0.25, 0.125]);
    }

    #[test]
    fn test_unknown_uniform_is_ignored() {
        let mut block = UniformBlock::default();
        let before = *block.values();

        block.set_float("u_Exposure", 2.0);
        block.set_float("u_Exposure", 3.0);

        assert_eq!(*block.values(), before);
        assert_eq!(block.warned.len(), 1);
    }

    #[test]
    fn test_type_mismatch_is_ignored() {
        let mut block = UniformBlock::default();
        let before = *block.values();

        block.set_float("u_Model", 1.0);

        assert_eq!(*block.values(), before);
    }

    #[test]
    fn test_sampler_table_tracks_declared_slots_only() {
        let mut table = SamplerTable::new(vec![
            TextureSlot::new("material.texture_diffuse1", TextureKind::Diffuse),
            TextureSlot::new("material.texture_specular1", TextureKind::Specular),
        ]);

        assert!(table.set_sampler("material.texture_specular1", 0));
        assert!(!table.set_sampler("material.texture_diffuse2", 1));

        let units: Vec<Option<u32>> = table.assignments().map(|(_, unit)| unit).collect();
        assert_eq!(units, vec![None, Some(0)]);

        table.reset();
        assert!(table.assignments().all(|(_, unit)| unit.is_none()));
    }
}
