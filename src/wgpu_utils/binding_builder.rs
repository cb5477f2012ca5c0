//! Builders for bind group layouts and bind groups
//!
//! Bindings are numbered in the order they are added, so a layout and the
//! bind groups created from it stay in sync without repeating indices.

/// A bind group layout together with the entries it was built from
pub struct BindGroupLayoutWithDesc {
    pub layout: wgpu::BindGroupLayout,
    pub entries: Vec<wgpu::BindGroupLayoutEntry>,
}

#[derive(Default)]
pub struct BindGroupLayoutBuilder {
    entries: Vec<wgpu::BindGroupLayoutEntry>,
    next_binding_index: u32,
}

impl BindGroupLayoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_binding(mut self, visibility: wgpu::ShaderStages, ty: wgpu::BindingType) -> Self {
        self.entries.push(wgpu::BindGroupLayoutEntry {
            binding: self.next_binding_index,
            visibility,
            ty,
            count: None,
        });
        self.next_binding_index += 1;
        self
    }

    /// Binding visible to both vertex and fragment stages
    pub fn next_binding_rendering(self, ty: wgpu::BindingType) -> Self {
        self.next_binding(wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT, ty)
    }

    pub fn next_binding_fragment(self, ty: wgpu::BindingType) -> Self {
        self.next_binding(wgpu::ShaderStages::FRAGMENT, ty)
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn create(self, device: &wgpu::Device, label: &str) -> BindGroupLayoutWithDesc {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &self.entries,
        });
        BindGroupLayoutWithDesc {
            layout,
            entries: self.entries,
        }
    }
}

pub struct BindGroupBuilder<'a> {
    layout_with_desc: &'a BindGroupLayoutWithDesc,
    entries: Vec<wgpu::BindGroupEntry<'a>>,
}

impl<'a> BindGroupBuilder<'a> {
    pub fn new(layout_with_desc: &'a BindGroupLayoutWithDesc) -> Self {
        Self {
            layout_with_desc,
            entries: Vec::new(),
        }
    }

    pub fn resource(mut self, resource: wgpu::BindingResource<'a>) -> Self {
        assert!(
            self.entries.len() < self.layout_with_desc.entries.len(),
            "more resources than layout entries"
        );
        let binding = self.layout_with_desc.entries[self.entries.len()].binding;
        self.entries.push(wgpu::BindGroupEntry { binding, resource });
        self
    }

    pub fn texture(self, view: &'a wgpu::TextureView) -> Self {
        self.resource(wgpu::BindingResource::TextureView(view))
    }

    pub fn sampler(self, sampler: &'a wgpu::Sampler) -> Self {
        self.resource(wgpu::BindingResource::Sampler(sampler))
    }

    pub fn create(self, device: &wgpu::Device, label: &str) -> wgpu::BindGroup {
        assert_eq!(
            self.entries.len(),
            self.layout_with_desc.entries.len(),
            "bind group '{}' does not fill every layout entry",
            label
        );
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.layout_with_desc.layout,
            entries: &self.entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_builder_numbers_bindings_in_order() {
        let builder = BindGroupLayoutBuilder::new()
            .next_binding_fragment(crate::wgpu_utils::binding_types::texture_2d())
            .next_binding_fragment(crate::wgpu_utils::binding_types::texture_2d())
            .next_binding_fragment(crate::wgpu_utils::binding_types::sampler(
                wgpu::SamplerBindingType::Filtering,
            ));

        let bindings: Vec<u32> = builder.entries.iter().map(|e| e.binding).collect();
        assert_eq!(bindings, vec![0, 1, 2]);
        assert_eq!(builder.entry_count(), 3);
    }
}
