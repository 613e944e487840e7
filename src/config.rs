//! Gallery layout, loadable from JSON.

use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::error::{RevealError, RevealResult};
use crate::reveal_plane::PlaneConfig;

fn default_scroll_extent() -> f32 {
    GalleryConfig::DEFAULT_SCROLL_EXTENT
}

/// Where the gallery camera sits and what it sees.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub position: Vec3,
    pub fov_degrees: f32,
    pub far: f32,
}

impl CameraConfig {
    pub fn camera(&self) -> Camera {
        Camera::default()
            .at(self.position)
            .with_fov(self.fov_degrees)
            .with_far(self.far)
    }
}

/// Every plane of a gallery plus its camera.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GalleryConfig {
    pub camera: CameraConfig,
    pub planes: Vec<PlaneConfig>,
    /// Wheel lines from the top of the page to the bottom.
    #[serde(default = "default_scroll_extent")]
    pub scroll_extent: f32,
    /// Orbit camera and debug panel instead of the scroll-driven header.
    #[serde(default)]
    pub controls: bool,
}

impl Default for GalleryConfig {
    /// The eight-plane header.
    fn default() -> Self {
        let plane = |name: &str, w: f32, h: f32, p: [f32; 3]| {
            PlaneConfig::new(format!("assets/{name}.jpeg"), w, h, Vec3::from(p))
        };
        Self {
            camera: CameraConfig {
                position: Vec3::new(0.0, 0.0, 6.0),
                fov_degrees: 70.0,
                far: 20.0,
            },
            planes: vec![
                // left top
                plane("deepmind", 5.0, 4.0, [-7.0, 2.0, -2.5])
                    .blurred(true)
                    .delay(0.32),
                plane("utopia", 3.8, 3.0, [-4.0, 3.0, -1.0]).delay(0.16),
                // top
                plane("owl", 2.4, 3.2, [1.0, 3.0, 0.0]).delay(0.12),
                plane("blade-runner", 4.0, 4.0, [6.0, 3.5, -3.0])
                    .blurred(true)
                    .delay(0.2),
                // right
                plane("couple-coffee", 3.5, 2.5, [5.0, -0.25, 0.0]),
                // left
                plane("dali-parrots", 2.8, 2.8, [-4.0, -2.0, -0.5]).delay(0.48),
                plane("yachts", 6.0, 4.0, [-6.5, -4.0, -2.0])
                    .blurred(true)
                    .delay(0.3),
                // bottom
                plane("scientists", 4.5, 3.0, [1.0, -3.8, -1.0]).delay(0.6),
            ],
            scroll_extent: Self::DEFAULT_SCROLL_EXTENT,
            controls: false,
        }
    }
}

impl GalleryConfig {
    pub const DEFAULT_SCROLL_EXTENT: f32 = 30.0;

    /// One 5x3 plane at the origin with the debug panel attached.
    pub fn controls() -> Self {
        Self {
            camera: CameraConfig {
                position: Vec3::new(0.0, 0.0, 4.0),
                fov_degrees: 70.0,
                far: 30.0,
            },
            planes: vec![
                PlaneConfig::new("assets/deepmind.jpeg", 5.0, 3.0, Vec3::ZERO).with_controls(true),
            ],
            scroll_extent: Self::DEFAULT_SCROLL_EXTENT,
            controls: true,
        }
    }

    /// Read and validate a JSON layout.
    pub fn load(path: impl AsRef<Path>) -> RevealResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| RevealError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        tracing::info!(path = %path.display(), planes = config.planes.len(), "loaded gallery config");
        Ok(config)
    }

    pub fn from_json(text: &str) -> RevealResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> RevealResult<()> {
        let camera = &self.camera;
        if !camera.position.is_finite() {
            return Err(RevealError::config("camera position is not finite"));
        }
        if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
            return Err(RevealError::config(format!(
                "camera fov must be between 0 and 180 degrees, got {}",
                camera.fov_degrees
            )));
        }
        if !(camera.far.is_finite() && camera.far > 0.1) {
            return Err(RevealError::config(format!(
                "camera far plane must lie beyond the near plane, got {}",
                camera.far
            )));
        }
        if !(self.scroll_extent.is_finite() && self.scroll_extent >= 0.0) {
            return Err(RevealError::config(format!(
                "scroll extent must be non-negative, got {}",
                self.scroll_extent
            )));
        }
        self.planes.iter().try_for_each(PlaneConfig::validate)
    }

    /// Resolve relative image paths against `root`.
    pub fn with_image_root(mut self, root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        for plane in &mut self.planes {
            if plane.image.is_relative() {
                plane.image = root.join(&plane.image);
            }
        }
        self
    }

    /// Distinct image paths in first-use order.
    pub fn image_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = Vec::new();
        for plane in &self.planes {
            if !paths.contains(&plane.image) {
                paths.push(plane.image.clone());
            }
        }
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_is_valid() {
        let config = GalleryConfig::default();
        config.validate().unwrap();
        assert_eq!(config.planes.len(), 8);
        assert_eq!(config.planes.iter().filter(|p| p.blurred).count(), 3);
        assert!(!config.controls);
        assert!(config.planes.iter().all(|p| !p.with_controls));
    }

    #[test]
    fn controls_page_has_one_controlled_plane() {
        let config = GalleryConfig::controls();
        config.validate().unwrap();
        assert_eq!(config.planes.len(), 1);
        let plane = &config.planes[0];
        assert_eq!((plane.width, plane.height), (5.0, 3.0));
        assert!(plane.with_controls);
        assert_eq!(config.camera.position.z, 4.0);
        assert_eq!(config.camera.far, 30.0);
    }

    #[test]
    fn json_fills_defaults() {
        let config = GalleryConfig::from_json(
            r#"{
                "camera": { "position": [0, 0, 6], "fov_degrees": 70, "far": 20 },
                "planes": [
                    { "image": "a.jpeg", "width": 2, "height": 1, "position": [1, 2, 3] }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(config.scroll_extent, GalleryConfig::DEFAULT_SCROLL_EXTENT);
        assert!(!config.controls);
        let plane = &config.planes[0];
        assert_eq!(plane.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(plane.delay, 0.0);
        assert!(!plane.blurred);
    }

    #[test]
    fn json_round_trips() {
        let config = GalleryConfig::default();
        let text = serde_json::to_string(&config).unwrap();
        assert_eq!(GalleryConfig::from_json(&text).unwrap(), config);
    }

    #[test]
    fn invalid_planes_are_reported() {
        let mut config = GalleryConfig::default();
        config.planes[3].delay = -1.0;
        assert!(matches!(config.validate(), Err(RevealError::Config(_))));
        assert!(matches!(
            GalleryConfig::from_json("{ not json"),
            Err(RevealError::Json(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = GalleryConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, RevealError::Io { .. }));
    }

    #[test]
    fn image_root_prefixes_relative_paths() {
        let config = GalleryConfig::default().with_image_root("/srv/gallery");
        assert_eq!(
            config.planes[0].image,
            PathBuf::from("/srv/gallery/assets/deepmind.jpeg")
        );
        assert_eq!(config.image_paths().len(), 8);
    }
}
