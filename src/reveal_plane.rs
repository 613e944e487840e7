//! The reveal plane: per-plane configuration and the graph built from it.
//!
//! A [`RevealGraph`] is a pure function of a [`PlaneConfig`] and the loaded
//! image's [`ImageInfo`]. Its color output crops the image to cover the plane,
//! optionally blurs it, and masks it with a rounded rectangle that grows with
//! the `reveal` uniform. Its position output swings the plane in about Y while
//! `enter_progress` runs and pushes it outward as `exit_progress` rises.

use std::path::PathBuf;

use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::{RevealError, RevealResult};
use crate::shader_graph::{
    EvalInputs, Expr, ShaderGraph, TextureSampler, Uniform, abs, add, evaluate, float, hash_blur,
    length, max, min, mix, mul, one_minus, position_local, rotation3d_y, select, smoothstep, sub,
    texture, uniform, uv, vec2, vec3, vec4,
};
use crate::texture::ImageInfo;
use crate::uniforms::UniformSet;

/// Radius of the hashed blur in UV units.
pub const BLUR_RADIUS: f32 = 0.06;
pub const BLUR_SAMPLES: u32 = 96;
/// Corner radius of the mask at full reveal.
pub const BORDER_RADIUS: f32 = 0.08;
/// Edge softness at `reveal = 0`.
pub const BASE_SOFTNESS: f32 = 0.1;
/// Edge softness at full reveal for sharp and blurred planes.
pub const SHARP_SOFTNESS: f32 = 0.0001;
pub const BLURRED_SOFTNESS: f32 = 0.1;
/// Exit travel at `exit_progress = 1`, X magnitude before the side sign.
pub const EXIT_OFFSET: Vec3 = Vec3::new(1.5, 10.0, 2.0);
/// Entry lift and push-back at `enter_progress = 0`.
pub const ENTER_OFFSET: f32 = 2.0;

/// Static parameters of one plane, fixed for the plane's lifetime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaneConfig {
    /// Image path, relative paths resolve against the gallery's image root.
    pub image: PathBuf,
    pub width: f32,
    pub height: f32,
    /// World position of the plane's centre.
    pub position: Vec3,
    #[serde(default)]
    pub blurred: bool,
    /// Seconds before the reveal starts.
    #[serde(default)]
    pub delay: f32,
    /// Lets the debug panel write this plane's uniforms.
    #[serde(default)]
    pub with_controls: bool,
}

impl PlaneConfig {
    pub fn new(image: impl Into<PathBuf>, width: f32, height: f32, position: impl Into<Vec3>) -> Self {
        Self {
            image: image.into(),
            width,
            height,
            position: position.into(),
            blurred: false,
            delay: 0.0,
            with_controls: false,
        }
    }

    pub fn blurred(mut self, blurred: bool) -> Self {
        self.blurred = blurred;
        self
    }

    pub fn delay(mut self, delay: f32) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_controls(mut self, with_controls: bool) -> Self {
        self.with_controls = with_controls;
        self
    }

    /// `width / height`
    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    /// Planes left of centre leave to the left. Zero counts as right.
    pub fn exits_left(&self) -> bool {
        self.position.x < 0.0
    }

    pub fn exit_sign(&self) -> f32 {
        if self.exits_left() { -1.0 } else { 1.0 }
    }

    pub fn validate(&self) -> RevealResult<()> {
        let label = self.image.display();
        if self.image.as_os_str().is_empty() {
            return Err(RevealError::config("plane has an empty image path"));
        }
        if !(self.width.is_finite() && self.width > 0.0 && self.height.is_finite() && self.height > 0.0)
        {
            return Err(RevealError::config(format!(
                "plane {label}: size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if !self.position.is_finite() {
            return Err(RevealError::config(format!("plane {label}: position is not finite")));
        }
        if !(self.delay.is_finite() && self.delay >= 0.0) {
            return Err(RevealError::config(format!(
                "plane {label}: delay must be a non-negative number of seconds, got {}",
                self.delay
            )));
        }
        Ok(())
    }
}

/// The inputs a built graph depends on. A change in any of them means the
/// plane's graph must be rebuilt.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphKey {
    pub blurred: bool,
    pub plane_aspect: f32,
    pub image_aspect: f32,
    pub exits_left: bool,
    pub image: String,
}

impl GraphKey {
    pub fn new(config: &PlaneConfig, image: &ImageInfo) -> Self {
        Self {
            blurred: config.blurred,
            plane_aspect: config.aspect(),
            image_aspect: image.aspect(),
            exits_left: config.exits_left(),
            image: image.source.clone(),
        }
    }
}

/// How the image is cropped to fill the plane without distortion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoverFit {
    /// Per-axis scale applied to `uv - 0.5`; 1 on the fitted axis.
    pub scale: Vec2,
    /// Half extent of the visible region in remapped UV space.
    pub half_size: Vec2,
}

impl CoverFit {
    pub fn new(plane_aspect: f32, image_aspect: f32) -> Self {
        let scale = if plane_aspect > image_aspect {
            Vec2::new(1.0, image_aspect / plane_aspect)
        } else {
            Vec2::new(plane_aspect / image_aspect, 1.0)
        };
        Self {
            scale,
            half_size: scale * 0.5,
        }
    }

    pub fn remap(&self, uv: Vec2) -> Vec2 {
        (uv - 0.5) * self.scale + 0.5
    }
}

/// The compiled-once graph of one plane.
#[derive(Clone, Debug)]
pub struct RevealGraph {
    key: GraphKey,
    cover: CoverFit,
    cover_uv: Expr,
    mask: Expr,
    color: Expr,
    position: Expr,
}

impl RevealGraph {
    #[tracing::instrument(skip_all, fields(image = %image.source))]
    pub fn build(config: &PlaneConfig, image: &ImageInfo) -> RevealResult<Self> {
        config.validate()?;
        if image.width == 0 || image.height == 0 {
            return Err(RevealError::config(format!("image {} has no pixels", image.source)));
        }

        let key = GraphKey::new(config, image);
        let cover = CoverFit::new(key.plane_aspect, key.image_aspect);

        let reveal = uniform(Uniform::Reveal);
        let blurred = uniform(Uniform::IsBlurred);

        let cover_uv = add(
            mul(sub(uv(), 0.5), vec2(cover.scale.x, cover.scale.y)),
            0.5,
        );

        let sharp = texture(&cover_uv);
        let soft = hash_blur(&cover_uv, BLUR_RADIUS, BLUR_SAMPLES);
        let base = select(&blurred, soft, sharp);

        let dist = sub(&cover_uv, 0.5);
        let revealing_half = mul(vec2(cover.half_size.x, cover.half_size.y), &reveal);
        let border = mul(BORDER_RADIUS, &reveal);
        let softness = mix(
            BASE_SOFTNESS,
            select(&blurred, BLURRED_SOFTNESS, SHARP_SOFTNESS),
            &reveal,
        );

        let d = sub(abs(dist), sub(sub(revealing_half, &border), &softness));
        let sdf = sub(
            add(min(max(d.x(), d.y()), 0.0), length(max(&d, 0.0))),
            &border,
        );
        let mask = one_minus(smoothstep(0.0, &softness, sdf));
        let color = mix(vec4([base.rgb(), float(0.0)]), &base, &mask);

        let t = one_minus(uniform(Uniform::EnterProgress));
        let exit = uniform(Uniform::ExitProgress);
        let entered = sub(
            mul(rotation3d_y(&t), position_local()),
            vec3(0.0, mul(&t, ENTER_OFFSET), mul(&t, ENTER_OFFSET)),
        );
        let exit_offset = vec3(
            mul(&exit, EXIT_OFFSET.x * config.exit_sign()),
            mul(&exit, EXIT_OFFSET.y),
            mul(&exit, EXIT_OFFSET.z),
        );
        let position = add(entered, exit_offset);

        // Type errors surface at build time rather than at first compile.
        color.value_type()?;
        position.value_type()?;

        tracing::debug!(?cover, blurred = key.blurred, "built reveal graph");

        Ok(Self {
            key,
            cover,
            cover_uv,
            mask,
            color,
            position,
        })
    }

    pub fn key(&self) -> &GraphKey {
        &self.key
    }

    pub fn cover(&self) -> CoverFit {
        self.cover
    }

    pub fn mask_node(&self) -> &Expr {
        &self.mask
    }

    /// Remapped texture coordinate for a plane UV.
    pub fn cover_uv_at(&self, uv: Vec2) -> RevealResult<Vec2> {
        self.eval_fragment(&self.cover_uv, uv, &UniformSet::default(), &Unsampled)?
            .as_vec2()
    }

    /// Reveal mask at `uv` for the given uniforms.
    pub fn mask_at(&self, uv: Vec2, uniforms: &UniformSet) -> RevealResult<f32> {
        self.eval_fragment(&self.mask, uv, uniforms, &Unsampled)?.as_f32()
    }

    /// Final RGBA at `uv`, sampling `image`.
    pub fn color_at(
        &self,
        uv: Vec2,
        uniforms: &UniformSet,
        image: &dyn TextureSampler,
    ) -> RevealResult<Vec4> {
        self.eval_fragment(&self.color, uv, uniforms, image)?.as_vec4()
    }

    /// Displaced local position of a vertex.
    pub fn position_at(&self, local: Vec3, uniforms: &UniformSet) -> RevealResult<Vec3> {
        evaluate(
            &self.position,
            &EvalInputs {
                uv: Vec2::ZERO,
                position_local: local,
                uniforms,
                texture: &Unsampled,
            },
        )?
        .as_vec3()
    }

    fn eval_fragment(
        &self,
        expr: &Expr,
        uv: Vec2,
        uniforms: &UniformSet,
        image: &dyn TextureSampler,
    ) -> RevealResult<crate::shader_graph::Value> {
        evaluate(
            expr,
            &EvalInputs {
                uv,
                position_local: Vec3::ZERO,
                uniforms,
                texture: image,
            },
        )
    }
}

impl ShaderGraph for RevealGraph {
    fn color_node(&self) -> &Expr {
        &self.color
    }

    fn position_node(&self) -> &Expr {
        &self.position
    }
}

/// Stand-in sampler for outputs that never read the image.
struct Unsampled;

impl TextureSampler for Unsampled {
    fn sample(&self, _uv: Vec2) -> Vec4 {
        Vec4::ZERO
    }
}
