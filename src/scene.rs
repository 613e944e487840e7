//! The gallery scene: plane instances, their shared replay signal, and the
//! per-frame update that feeds the renderer.

use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use glam::{Mat4, Vec3};
use winit::keyboard::KeyCode;

use crate::animation::{FrameInput, PlaneAnimator, ScrollTracker, Ticker};
use crate::camera::Camera;
use crate::config::GalleryConfig;
use crate::controls::{Channel, ControlPanel, PanelWrite};
use crate::error::{RevealError, RevealResult};
use crate::input::Input;
use crate::orbit_camera::OrbitCamera;
use crate::reveal_plane::{GraphKey, PlaneConfig, RevealGraph};
use crate::shader_graph::{CompiledProgram, ShaderGraph, Uniform};
use crate::texture::ImageSource;
use crate::uniforms::{UniformCell, UniformWriter};

/// Shared replay trigger. Every [`ReplaySignal::trigger`] bumps the
/// generation; planes restart when they see a generation they have not seen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplaySignal {
    generation: u64,
}

impl ReplaySignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        tracing::info!(generation = self.generation, "replay triggered");
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// One live plane: its config, graph, compiled program, uniforms and timelines.
#[derive(Debug)]
pub struct PlaneInstance {
    config: PlaneConfig,
    image: Rc<ImageSource>,
    graph: RevealGraph,
    program: CompiledProgram,
    uniforms: UniformCell,
    animator: PlaneAnimator,
    seen_generation: u64,
}

impl PlaneInstance {
    /// Build the plane's graph and start its timelines at `now`.
    pub fn mount(
        config: PlaneConfig,
        image: Rc<ImageSource>,
        now: f32,
        replay: &ReplaySignal,
    ) -> RevealResult<Self> {
        let graph = RevealGraph::build(&config, image.info())?;
        let program = graph.compile()?;
        tracing::debug!(
            image = %config.image.display(),
            fingerprint = program.fingerprint,
            "mounted plane"
        );
        let mut animator = PlaneAnimator::new(config.delay);
        animator.start(now);
        Ok(Self {
            uniforms: UniformCell::new(config.blurred),
            config,
            image,
            graph,
            program,
            animator,
            seen_generation: replay.generation(),
        })
    }

    pub fn config(&self) -> &PlaneConfig {
        &self.config
    }

    pub fn image(&self) -> &ImageSource {
        &self.image
    }

    pub fn graph(&self) -> &RevealGraph {
        &self.graph
    }

    pub fn program(&self) -> &CompiledProgram {
        &self.program
    }

    pub fn uniforms(&self) -> &UniformCell {
        &self.uniforms
    }

    /// Swap in a new config or image. The graph is rebuilt only when
    /// something it depends on changed; returns whether it was.
    ///
    /// A rebuilt graph starts over: fresh uniforms owned by the timelines,
    /// and reveal and enter restarted from `now`.
    pub fn reconfigure(
        &mut self,
        config: PlaneConfig,
        image: Rc<ImageSource>,
        now: f32,
    ) -> RevealResult<bool> {
        let key = GraphKey::new(&config, image.info());
        let rebuilt = key != *self.graph.key();
        if rebuilt {
            let graph = RevealGraph::build(&config, image.info())?;
            let program = graph.compile()?;
            tracing::debug!(
                image = %config.image.display(),
                fingerprint = program.fingerprint,
                "rebuilt plane graph"
            );
            self.graph = graph;
            self.program = program;
            self.uniforms = UniformCell::new(config.blurred);
        } else {
            self.uniforms.set_blurred(config.blurred);
        }

        let delay_changed = config.delay != self.config.delay;
        if delay_changed {
            self.animator = PlaneAnimator::new(config.delay);
        }
        if rebuilt || delay_changed {
            self.animator.start(now);
        }
        self.config = config;
        self.image = image;
        Ok(rebuilt)
    }

    /// Restart on a new replay generation, then advance the timelines.
    pub fn update(&mut self, frame: &FrameInput, replay: &ReplaySignal) {
        if replay.generation() != self.seen_generation {
            self.seen_generation = replay.generation();
            self.uniforms.hand_over(UniformWriter::Timeline);
            self.animator.start(frame.elapsed);
        }
        self.animator.update(frame, &mut self.uniforms);
    }

    /// Apply a panel write. Planes without controls ignore it.
    ///
    /// The first reveal or position write takes those scalars away from the
    /// timelines, which are cancelled. Blur writes leave the timelines running.
    pub fn apply_panel(&mut self, write: PanelWrite) -> bool {
        if !self.config.with_controls {
            return false;
        }
        if write.channel.claims_timelines() && self.uniforms.authority() != UniformWriter::Panel {
            self.animator.cancel_clock();
            self.uniforms.hand_over(UniformWriter::Panel);
        }
        let slots: &[Uniform] = match write.channel {
            Channel::Blur => {
                self.uniforms.set_blurred(write.value > 0.5);
                &[]
            }
            Channel::Reveal => &[Uniform::Reveal],
            Channel::Position => &[Uniform::EnterProgress],
            Channel::Both => &[Uniform::Reveal, Uniform::EnterProgress],
        };
        for &slot in slots {
            self.uniforms.write(UniformWriter::Panel, slot, write.value);
        }
        tracing::debug!(channel = write.channel.label(), value = write.value, "panel write");
        true
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.config.position)
    }

    /// World position of the plane's centre after entry and exit offsets.
    pub fn world_center(&self) -> RevealResult<Vec3> {
        let local = self.graph.position_at(Vec3::ZERO, self.uniforms.read())?;
        Ok(self.config.position + local)
    }

    pub fn unmount(&mut self) {
        self.animator.unmount();
    }
}

/// How the view is driven.
#[derive(Clone, Debug)]
pub enum CameraRig {
    /// Fixed camera; the wheel scrolls the page.
    Fixed(Camera),
    /// Orbit camera; the wheel zooms.
    Orbit(OrbitCamera),
}

impl CameraRig {
    pub fn camera(&self) -> Camera {
        match self {
            CameraRig::Fixed(camera) => *camera,
            CameraRig::Orbit(orbit) => orbit.camera(),
        }
    }
}

/// The whole scene.
#[derive(Debug)]
pub struct Gallery {
    planes: Vec<PlaneInstance>,
    replay: ReplaySignal,
    scroll: ScrollTracker,
    ticker: Ticker,
    rig: CameraRig,
    panel: Option<ControlPanel>,
}

impl Gallery {
    /// Decode every image the config names (once per path) and mount the planes.
    pub fn load(config: &GalleryConfig) -> RevealResult<Self> {
        let mut images: HashMap<PathBuf, Rc<ImageSource>> = HashMap::new();
        for path in config.image_paths() {
            let image = ImageSource::load(&path)?;
            images.insert(path, Rc::new(image));
        }
        Self::with_images(config, |path| images.get(path).cloned())
    }

    /// Mount the planes using already decoded images.
    pub fn with_images(
        config: &GalleryConfig,
        mut image_for: impl FnMut(&PathBuf) -> Option<Rc<ImageSource>>,
    ) -> RevealResult<Self> {
        config.validate()?;
        let replay = ReplaySignal::new();
        let planes = config
            .planes
            .iter()
            .map(|plane| {
                let image = image_for(&plane.image).ok_or_else(|| {
                    RevealError::config(format!(
                        "no image loaded for {}",
                        plane.image.display()
                    ))
                })?;
                PlaneInstance::mount(plane.clone(), image, 0.0, &replay)
            })
            .collect::<RevealResult<Vec<_>>>()?;

        let camera = config.camera.camera();
        let rig = if config.controls {
            CameraRig::Orbit(OrbitCamera::from_camera(&camera))
        } else {
            CameraRig::Fixed(camera)
        };
        let panel = config.controls.then(|| {
            let blurred = config
                .planes
                .iter()
                .find(|p| p.with_controls)
                .is_some_and(|p| p.blurred);
            ControlPanel::new(blurred)
        });

        tracing::info!(planes = planes.len(), controls = config.controls, "gallery ready");
        Ok(Self {
            planes,
            replay,
            scroll: ScrollTracker::new(config.scroll_extent),
            ticker: Ticker::new(),
            rig,
            panel,
        })
    }

    pub fn planes(&self) -> &[PlaneInstance] {
        &self.planes
    }

    pub fn planes_mut(&mut self) -> &mut [PlaneInstance] {
        &mut self.planes
    }

    pub fn replay(&mut self) {
        self.replay.trigger();
    }

    pub fn scroll(&self) -> &ScrollTracker {
        &self.scroll
    }

    pub fn scroll_mut(&mut self) -> &mut ScrollTracker {
        &mut self.scroll
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn panel(&self) -> Option<&ControlPanel> {
        self.panel.as_ref()
    }

    pub fn camera(&self) -> Camera {
        self.rig.camera()
    }

    /// One frame on the wall clock.
    pub fn frame(&mut self, input: &Input) {
        self.handle_input(input);
        self.ticker.tick();
        self.animate();
    }

    /// One frame advancing time by exactly `dt`.
    pub fn frame_fixed(&mut self, input: &Input, dt: f32) {
        self.handle_input(input);
        self.ticker.advance(dt);
        self.animate();
    }

    fn handle_input(&mut self, input: &Input) {
        if input.key_pressed(KeyCode::KeyR) {
            self.replay();
        }
        match &mut self.rig {
            CameraRig::Orbit(orbit) => orbit.update(input),
            CameraRig::Fixed(_) => self.scroll.wheel(input.scroll_delta().y),
        }
        if let Some(write) = self.panel.as_mut().and_then(|p| p.handle_input(input)) {
            for plane in &mut self.planes {
                plane.apply_panel(write);
            }
        }
    }

    fn animate(&mut self) {
        let frame = self.ticker.frame_input(self.scroll.progress());
        for plane in &mut self.planes {
            plane.update(&frame, &self.replay);
        }
        if let Some(panel) = &mut self.panel {
            if let Some(plane) = self.planes.iter().find(|p| p.config.with_controls) {
                // Replay or a rebuild gave the values back to the timelines.
                if plane.uniforms.authority() == UniformWriter::Timeline {
                    panel.resume();
                }
                panel.mirror(plane.uniforms.read());
            }
        }
    }

    /// Plane indices back to front: farthest (lowest world z) first.
    pub fn draw_order(&self) -> RevealResult<Vec<usize>> {
        let mut depths = self
            .planes
            .iter()
            .enumerate()
            .map(|(i, plane)| Ok((i, plane.world_center()?.z)))
            .collect::<RevealResult<Vec<_>>>()?;
        depths.sort_by(|a, b| a.1.total_cmp(&b.1));
        Ok(depths.into_iter().map(|(i, _)| i).collect())
    }

    /// Window title text: the panel state in controls mode.
    pub fn title(&self, base: &str) -> String {
        match &self.panel {
            Some(panel) => format!("{base} | {}", panel.title()),
            None => base.to_string(),
        }
    }
}

impl Drop for Gallery {
    fn drop(&mut self) {
        for plane in &mut self.planes {
            plane.unmount();
        }
    }
}
