//! # Reveal Gallery
//!
//! An animated gallery of images on 3D planes. Each plane's image is cropped
//! to cover the plane, masked by a rounded rectangle that grows as the plane
//! is revealed, and swung into place as it enters. Scrolling pushes the
//! planes out of view.
//!
//! The pieces, leaves first:
//!
//! - [`rotation3d_y`] builds the Y-axis rotation used during entry
//! - [`shader_graph`] is a small typed expression graph that compiles to WGSL
//!   and can also be evaluated on the CPU
//! - [`RevealGraph`] builds one plane's color and position graphs
//! - [`animation`] drives each plane's reveal, enter and exit scalars
//! - [`Gallery`] mounts the planes and runs them frame by frame
//!
//! ## Quick Start
//!
//! ```no_run
//! use reveal_gallery::*;
//!
//! fn main() -> RevealResult<()> {
//!     run(AppConfig::new().title("Gallery"), GalleryConfig::default())
//! }
//! ```
//!
//! ## Headless use
//!
//! Nothing below [`run`] needs a GPU. A gallery can be stepped with fixed
//! time steps and its planes queried through the CPU evaluator:
//!
//! ```
//! use std::rc::Rc;
//! use reveal_gallery::*;
//!
//! let pixels = image::RgbaImage::from_pixel(16, 10, image::Rgba([255, 0, 0, 255]));
//! let image = Rc::new(ImageSource::from_rgba("red".into(), pixels));
//! let mut gallery = Gallery::with_images(&GalleryConfig::controls(), |_| Some(image.clone()))?;
//!
//! for _ in 0..20 {
//!     gallery.frame_fixed(&Input::new(), 0.1);
//! }
//! let plane = &gallery.planes()[0];
//! assert_eq!(plane.uniforms().read().reveal(), 1.0);
//! # Ok::<(), RevealError>(())
//! ```

pub mod animation;
mod app;
mod camera;
mod config;
mod controls;
mod error;
mod gpu;
mod input;
mod mesh;
mod orbit_camera;
mod reveal_pass;
mod reveal_plane;
mod rotation;
mod scene;
pub mod shader_graph;
mod texture;
mod uniforms;

pub use app::{AppConfig, run};
pub use camera::Camera;
pub use config::{CameraConfig, GalleryConfig};
pub use controls::{Channel, ControlPanel, PanelWrite};
pub use error::{RevealError, RevealResult};
pub use gpu::{GpuContext, GpuSupport};
pub use input::Input;
pub use mesh::{Mesh, Vertex3d, plane_geometry};
pub use orbit_camera::OrbitCamera;
pub use reveal_pass::RevealPass;
pub use reveal_plane::{
    BLUR_RADIUS, BLUR_SAMPLES, BORDER_RADIUS, CoverFit, GraphKey, PlaneConfig, RevealGraph,
};
pub use rotation::{ROTATION3D_Y_WGSL, rotation3d_y};
pub use scene::{CameraRig, Gallery, PlaneInstance, ReplaySignal};
pub use texture::{ImageInfo, ImageSource, Texture};
pub use uniforms::{PlaneUniformBlock, UniformCell, UniformSet, UniformWriter};

// Re-export glam math types for convenience
pub use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

// Re-export commonly used winit types for convenience
pub use winit::keyboard::KeyCode;
