use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::config::GalleryConfig;
use crate::error::{RevealError, RevealResult};
use crate::gpu::{GpuContext, GpuSupport};
use crate::input::Input;
use crate::reveal_pass::RevealPass;
use crate::scene::Gallery;

/// Configuration for the app window.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Background behind the planes.
    pub clear_color: wgpu::Color,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Reveal Gallery".to_string(),
            width: 1280,
            height: 720,
            clear_color: wgpu::Color::WHITE,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn clear_color(mut self, color: wgpu::Color) -> Self {
        self.clear_color = color;
        self
    }
}

/// Open a window and run the gallery until it is closed.
///
/// Returns the first fatal error: GPU initialization, image decoding or a
/// graph fault. A machine without a rendering backend is not an error; the
/// window shows a notice in its title and stays empty.
///
/// # Example
/// ```no_run
/// use reveal_gallery::{AppConfig, GalleryConfig};
///
/// reveal_gallery::run(AppConfig::new().size(1280, 720), GalleryConfig::default())?;
/// # Ok::<(), reveal_gallery::RevealError>(())
/// ```
pub fn run(config: AppConfig, gallery: GalleryConfig) -> RevealResult<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = RevealApp {
        config,
        gallery,
        state: AppState::Pending,
        fatal: None,
    };
    event_loop.run_app(&mut app)?;

    match app.fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct RevealApp {
    config: AppConfig,
    gallery: GalleryConfig,
    state: AppState,
    fatal: Option<RevealError>,
}

enum AppState {
    Pending,
    /// No adapter: nothing is rendered.
    Unsupported {
        /// Held so the notice window stays open.
        _window: Arc<Window>,
    },
    Running(Box<Running>),
}

struct Running {
    window: Arc<Window>,
    gpu: GpuContext,
    pass: RevealPass,
    gallery: Gallery,
    input: Input,
    title: String,
}

impl RevealApp {
    fn start(&mut self, event_loop: &ActiveEventLoop) -> RevealResult<AppState> {
        let window_attrs = WindowAttributes::default()
            .with_title(&self.config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.width,
                self.config.height,
            ));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        match pollster::block_on(GpuContext::detect()) {
            GpuSupport::Supported { adapter, backend } => {
                tracing::info!(%adapter, %backend, "rendering backend available");
            }
            GpuSupport::Unsupported { reason } => {
                tracing::warn!(%reason, "no rendering backend, showing notice");
                window.set_title(&format!("{} - rendering is not supported on this device", self.config.title));
                return Ok(AppState::Unsupported { _window: window });
            }
        }

        let gpu = pollster::block_on(GpuContext::new(window.clone()))?;
        let pass = RevealPass::new(&gpu);
        let gallery = Gallery::load(&self.gallery)?;
        let title = gallery.title(&self.config.title);
        window.set_title(&title);
        window.request_redraw();

        Ok(AppState::Running(Box::new(Running {
            window,
            gpu,
            pass,
            gallery,
            input: Input::new(),
            title,
        })))
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: RevealError) {
        tracing::error!(%err, "fatal error");
        self.fatal = Some(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for RevealApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !matches!(self.state, AppState::Pending) {
            return;
        }
        match self.start(event_loop) {
            Ok(state) => self.state = state,
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if matches!(event, WindowEvent::CloseRequested) {
            event_loop.exit();
            return;
        }

        let AppState::Running(running) = &mut self.state else {
            return;
        };
        running.input.handle_event(&event);

        match event {
            WindowEvent::Resized(size) => {
                running.gpu.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                let Running {
                    window,
                    gpu,
                    pass,
                    gallery,
                    input,
                    title,
                } = running.as_mut();

                // input -> ticker -> timelines -> panel, then the renderer reads
                gallery.frame(input);

                let next_title = gallery.title(&self.config.title);
                if next_title != *title {
                    window.set_title(&next_title);
                    *title = next_title;
                }

                if let Err(err) = pass.render(gpu, gallery, self.config.clear_color) {
                    self.fail(event_loop, err);
                    return;
                }

                input.begin_frame();
                window.request_redraw();
            }
            _ => {}
        }
    }
}
