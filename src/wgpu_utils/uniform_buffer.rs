use std::marker::PhantomData;

/// Typed uniform buffer that skips writes when the content is unchanged
pub struct UniformBuffer<Content> {
    buffer: wgpu::Buffer,
    content_type: PhantomData<Content>,
    previous_content: Vec<u8>,
}

impl<Content: bytemuck::Pod> UniformBuffer<Content> {
    fn name() -> &'static str {
        let type_name = std::any::type_name::<Content>();
        let pos = type_name.rfind(':').unwrap_or(0);
        if pos > 0 {
            &type_name[(pos + 1)..]
        } else {
            type_name
        }
    }

    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("UniformBuffer: {}", Self::name())),
            size: std::mem::size_of::<Content>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        UniformBuffer {
            buffer,
            content_type: PhantomData,
            previous_content: Vec::new(),
        }
    }

    /// Writes `content` unless it matches the last write.
    ///
    /// Returns whether a write was queued.
    pub fn update_content(&mut self, queue: &wgpu::Queue, content: &Content) -> bool {
        let new_content = bytemuck::bytes_of(content);
        if self.previous_content == new_content {
            return false;
        }
        queue.write_buffer(&self.buffer, 0, new_content);
        self.previous_content = new_content.to_vec();
        true
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_strips_module_path() {
        assert_eq!(UniformBuffer::<[f32; 4]>::name(), "[f32; 4]");
        assert_eq!(
            UniformBuffer::<crate::gfx::rendering::shader_program::SceneUniforms>::name(),
            "SceneUniforms"
        );
    }
}
