//! Core GPU context and device management.
//!
//! [`GpuContext`] holds the wgpu device, queue, surface and surface
//! configuration and is passed by reference to the reveal pass.
//!
//! Initialization is `async` (wgpu's adapter and device requests are
//! futures); the app awaits it with `pollster::block_on`. Before that,
//! [`GpuContext::detect`] answers whether any adapter exists at all, so a
//! machine without a usable backend ends in [`GpuSupport::Unsupported`]
//! instead of an error.
//!
//! # Example
//!
//! ```no_run
//! # fn demo(window: std::sync::Arc<winit::window::Window>) -> reveal_gallery::RevealResult<()> {
//! use reveal_gallery::GpuContext;
//!
//! let gpu = pollster::block_on(GpuContext::new(window))?;
//! println!("{}x{} (aspect: {})", gpu.width(), gpu.height(), gpu.aspect());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use winit::window::Window;

use crate::error::{RevealError, RevealResult};

/// Outcome of the renderer capability check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GpuSupport {
    Supported { adapter: String, backend: String },
    /// No adapter could be found; the app shows a static notice.
    Unsupported { reason: String },
}

impl GpuSupport {
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Supported { .. })
    }
}

fn instance() -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    })
}

/// Core GPU context holding wgpu resources.
///
/// All fields are public to allow direct access to wgpu APIs when needed.
pub struct GpuContext {
    /// The surface for presenting rendered frames to the window.
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    /// Current surface configuration (format, size, present mode).
    pub config: wgpu::SurfaceConfiguration,
}

impl GpuContext {
    /// Check whether any primary-backend adapter is available.
    pub async fn detect() -> GpuSupport {
        let instance = instance();
        match instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
        {
            Ok(adapter) => {
                let info = adapter.get_info();
                GpuSupport::Supported {
                    adapter: info.name,
                    backend: format!("{:?}", info.backend),
                }
            }
            Err(err) => GpuSupport::Unsupported {
                reason: err.to_string(),
            },
        }
    }

    /// Create a new GPU context from a winit window.
    ///
    /// Creates the instance and surface, picks an adapter compatible with the
    /// surface, creates the device and configures the surface with an sRGB
    /// format and Fifo presentation.
    pub async fn new(window: Arc<Window>) -> RevealResult<Self> {
        let size = window.inner_size();
        let instance = instance();
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|err| RevealError::gpu(format!("no suitable adapter: {err}")))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Reveal Gallery Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| RevealError::gpu("surface reports no formats"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        tracing::info!(
            adapter = %adapter.get_info().name,
            format = ?surface_format,
            width = config.width,
            height = config.height,
            "gpu context ready"
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
        })
    }

    /// Resize the surface. Zero-sized dimensions (minimized window) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }

    /// Current aspect ratio (width / height).
    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }
}
