//! Texture resource management for wgpu
//!
//! Provides utilities for creating GPU textures, views, and samplers:
//! depth buffers, mipmapped material textures decoded from image files, and
//! the 1x1 fallbacks bound when a material slot is empty.

use std::path::Path;

use image::RgbaImage;

use crate::error::TextureError;
use crate::gfx::scene::mesh::TextureKind;
use crate::gfx::scene::model::TextureUploader;

/// GPU texture resource containing texture, view, and sampler
///
/// Bundles the three main components needed for texture operations:
/// - Texture: The actual GPU memory allocation
/// - View: Interface for shader access
/// - Sampler: Filtering and addressing configuration
#[derive(Clone, Debug)]
pub struct TextureResource {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl TextureResource {
    /// Depth buffer format used by every pipeline
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Colour format for material textures
    pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    /// Creates a depth texture matching the surface configuration
    ///
    /// # Arguments
    /// * `device` - WGPU device for creating resources
    /// * `config` - Surface configuration to match dimensions
    /// * `label` - Debug label for the texture
    pub fn create_depth_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[Self::DEPTH_FORMAT],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            lod_min_clamp: 0.0,
            lod_max_clamp: 100.0,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Decodes an image file and uploads it with a full mip chain
    pub fn from_path(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: &Path,
    ) -> Result<Self, TextureError> {
        let image = decode_rgba(path)?;
        let label = path.display().to_string();
        Ok(Self::from_rgba_mipmapped(device, queue, &image, &label))
    }

    /// Uploads an RGBA image, generating every mip level on the CPU
    ///
    /// Sampling repeats in both directions, magnifies linearly and minifies
    /// trilinearly.
    pub fn from_rgba_mipmapped(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &RgbaImage,
        label: &str,
    ) -> Self {
        let levels = mip_chain(image);

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: image.width(),
                height: image.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: levels.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::COLOR_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (level, mip) in levels.iter().enumerate() {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: level as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                mip.as_raw(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * mip.width()),
                    rows_per_image: Some(mip.height()),
                },
                wgpu::Extent3d {
                    width: mip.width(),
                    height: mip.height(),
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// A 1x1 texture of a single colour
    pub fn solid(device: &wgpu::Device, queue: &wgpu::Queue, rgba: [u8; 4], label: &str) -> Self {
        let image = RgbaImage::from_pixel(1, 1, image::Rgba(rgba));
        Self::from_rgba_mipmapped(device, queue, &image, label)
    }
}

/// Reads an image file, accepting only RGB and RGBA sources
pub fn decode_rgba(path: &Path) -> Result<RgbaImage, TextureError> {
    let image = image::open(path).map_err(|source| TextureError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let channels = image.color().channel_count();
    if channels != 3 && channels != 4 {
        return Err(TextureError::UnsupportedChannels {
            path: path.to_path_buf(),
            channels,
        });
    }

    Ok(image.to_rgba8())
}

/// Base image followed by successively halved levels down to 1x1
pub fn mip_chain(image: &RgbaImage) -> Vec<RgbaImage> {
    let mut levels = vec![image.clone()];
    let (mut width, mut height) = image.dimensions();

    while width > 1 || height > 1 {
        width = (width / 2).max(1);
        height = (height / 2).max(1);
        let next = image::imageops::resize(
            image,
            width,
            height,
            image::imageops::FilterType::Triangle,
        );
        levels.push(next);
    }

    levels
}

/// Textures bound when a material leaves a sampler slot empty
pub struct FallbackTextures {
    /// White, used for colour-like slots
    pub white: TextureResource,
    /// Black, used for highlight-like slots
    pub black: TextureResource,
}

impl FallbackTextures {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self {
            white: TextureResource::solid(device, queue, [255, 255, 255, 255], "Fallback White"),
            black: TextureResource::solid(device, queue, [0, 0, 0, 255], "Fallback Black"),
        }
    }

    pub fn for_kind(&self, kind: TextureKind) -> &TextureResource {
        match kind {
            TextureKind::Diffuse | TextureKind::Normal => &self.white,
            TextureKind::Specular | TextureKind::Height => &self.black,
        }
    }
}

/// Uploads model textures through a wgpu device and queue
pub struct GpuTextureUploader<'a> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
}

impl<'a> GpuTextureUploader<'a> {
    pub fn new(device: &'a wgpu::Device, queue: &'a wgpu::Queue) -> Self {
        Self { device, queue }
    }
}

impl TextureUploader for GpuTextureUploader<'_> {
    type Texture = TextureResource;

    fn upload(&mut self, path: &Path, kind: TextureKind) -> Result<TextureResource, TextureError> {
        log::debug!("Uploading {:?} texture {}", kind, path.display());
        TextureResource::from_path(self.device, self.queue, path)
    }
}
