//! Decoded images and their GPU textures.

use std::path::Path;

use glam::{Vec2, Vec4};

use crate::error::RevealResult;
use crate::gpu::GpuContext;
use crate::shader_graph::TextureSampler;

/// Dimensions and identity of a loaded image, all a graph needs to know.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageInfo {
    /// Where the image came from; identifies it for graph rebuilds.
    pub source: String,
    pub width: u32,
    pub height: u32,
}

impl ImageInfo {
    /// `width / height`
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// A decoded RGBA8 image tagged as display sRGB.
#[derive(Clone, Debug)]
pub struct ImageSource {
    info: ImageInfo,
    pixels: image::RgbaImage,
}

impl ImageSource {
    /// Load and decode an image file.
    pub fn load(path: impl AsRef<Path>) -> RevealResult<Self> {
        let path = path.as_ref();
        let pixels = image::open(path)?.to_rgba8();
        tracing::debug!(path = %path.display(), width = pixels.width(), height = pixels.height(), "decoded image");
        Ok(Self::from_rgba(path.display().to_string(), pixels))
    }

    /// Decode an image from embedded bytes.
    pub fn from_bytes(bytes: &[u8], label: &str) -> RevealResult<Self> {
        let pixels = image::load_from_memory(bytes)?.to_rgba8();
        Ok(Self::from_rgba(label.to_string(), pixels))
    }

    pub fn from_rgba(source: String, pixels: image::RgbaImage) -> Self {
        let (width, height) = pixels.dimensions();
        Self {
            info: ImageInfo {
                source,
                width,
                height,
            },
            pixels,
        }
    }

    pub fn info(&self) -> &ImageInfo {
        &self.info
    }

    pub fn pixels(&self) -> &image::RgbaImage {
        &self.pixels
    }

    fn texel(&self, x: i64, y: i64) -> Vec4 {
        let x = x.clamp(0, self.info.width as i64 - 1) as u32;
        let y = y.clamp(0, self.info.height as i64 - 1) as u32;
        let [r, g, b, a] = self.pixels.get_pixel(x, y).0;
        Vec4::new(
            srgb_to_linear(r),
            srgb_to_linear(g),
            srgb_to_linear(b),
            a as f32 / 255.0,
        )
    }
}

fn srgb_to_linear(channel: u8) -> f32 {
    let c = channel as f32 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

impl TextureSampler for ImageSource {
    /// Bilinear, clamp-to-edge; returns linear color like an sRGB texture view.
    fn sample(&self, uv: Vec2) -> Vec4 {
        if self.info.width == 0 || self.info.height == 0 {
            return Vec4::ZERO;
        }
        let px = uv.x.clamp(0.0, 1.0) * self.info.width as f32 - 0.5;
        let py = uv.y.clamp(0.0, 1.0) * self.info.height as f32 - 0.5;
        let x0 = px.floor();
        let y0 = py.floor();
        let tx = px - x0;
        let ty = py - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = self.texel(x0, y0).lerp(self.texel(x0 + 1, y0), tx);
        let bottom = self.texel(x0, y0 + 1).lerp(self.texel(x0 + 1, y0 + 1), tx);
        top.lerp(bottom, ty)
    }
}

/// A GPU texture that can be bound to shaders.
#[derive(Debug)]
pub struct Texture {
    #[allow(dead_code)]
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    /// Create a texture from raw RGBA data in display sRGB.
    pub fn from_rgba(gpu: &GpuContext, data: &[u8], width: u32, height: u32, label: &str) -> Self {
        use wgpu::util::DeviceExt;

        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Cover-fit and blur offsets land outside [0, 1]; clamp instead of wrapping.
        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            width,
            height,
        }
    }

    /// Upload a decoded image.
    pub fn from_image(gpu: &GpuContext, image: &ImageSource) -> Self {
        let info = image.info();
        Self::from_rgba(gpu, image.pixels(), info.width, info.height, &info.source)
    }
}
