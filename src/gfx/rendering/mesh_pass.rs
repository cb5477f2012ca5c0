//! Recording mesh draws into a wgpu render pass

use crate::gfx::resources::texture_resource::{FallbackTextures, TextureResource};
use crate::gfx::scene::mesh::{Mesh, MeshTarget, Texture, TextureId};

use super::shader_program::ShaderProgram;

pub trait DrawMesh {
    fn draw_mesh(&mut self, mesh: &Mesh, index_count: u32);
}

impl DrawMesh for wgpu::RenderPass<'_> {
    fn draw_mesh(&mut self, mesh: &Mesh, index_count: u32) {
        // Skip drawing if not uploaded
        let (Some(vertex_buffer), Some(index_buffer)) = (&mesh.vertex_buffer, &mesh.index_buffer)
        else {
            return;
        };

        self.set_vertex_buffer(0, vertex_buffer.slice(..));
        self.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..index_count, 0, 0..1);
    }
}

/// A render pass with one program bound, accepting mesh draws.
///
/// Texture units assigned by the mesh are resolved against the program's
/// declared sampler slots; slots left empty get a fallback texture.
pub struct ProgramPass<'p, 'pass> {
    pass: &'p mut wgpu::RenderPass<'pass>,
    program: &'p mut ShaderProgram,
    device: &'p wgpu::Device,
    fallbacks: &'p FallbackTextures,
    units: Vec<Option<(TextureId, TextureResource)>>,
}

impl<'p, 'pass> ProgramPass<'p, 'pass> {
    /// Binds `program` on `pass`; uniforms must already be flushed
    pub fn begin(
        pass: &'p mut wgpu::RenderPass<'pass>,
        program: &'p mut ShaderProgram,
        device: &'p wgpu::Device,
        fallbacks: &'p FallbackTextures,
    ) -> Self {
        program.bind(pass);
        Self {
            pass,
            program,
            device,
            fallbacks,
            units: Vec::new(),
        }
    }

    fn finish_draw(&mut self) {
        self.units.clear();
        self.program.reset_samplers();
    }
}

impl MeshTarget<TextureResource> for ProgramPass<'_, '_> {
    fn set_sampler(&mut self, name: &str, unit: u32) {
        self.program.set_sampler(name, unit);
    }

    fn bind_texture(&mut self, unit: u32, texture: &Texture<TextureResource>) {
        let unit = unit as usize;
        if self.units.len() <= unit {
            self.units.resize(unit + 1, None);
        }
        self.units[unit] = Some((texture.id, texture.handle.clone()));
    }

    fn draw_indexed(&mut self, mesh: &Mesh, index_count: u32) {
        if !mesh.is_uploaded() {
            log::debug!("Skipping mesh without GPU buffers");
            self.finish_draw();
            return;
        }

        if self.program.has_textures() {
            let mut key = Vec::new();
            let mut textures = Vec::new();
            for (slot, unit) in self.program.samplers().assignments() {
                let bound = unit
                    .and_then(|unit| self.units.get(unit as usize))
                    .and_then(Option::as_ref);
                match bound {
                    Some((id, resource)) => {
                        key.push(Some(*id));
                        textures.push(resource);
                    }
                    None => {
                        key.push(None);
                        textures.push(self.fallbacks.for_kind(slot.kind));
                    }
                }
            }

            if let Some(bind_group) = self.program.texture_bind_group(self.device, key, &textures) {
                self.pass.set_bind_group(1, bind_group, &[]);
            }
        }

        self.pass.draw_mesh(mesh, index_count);
        self.finish_draw();
    }
}
