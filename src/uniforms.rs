//! Per-plane uniform scalars and the write-authority rules around them.
//!
//! Each plane owns one [`UniformCell`]. The animation driver and the debug
//! panel are the only writers and must present a [`UniformWriter`] with each
//! write; the renderer only reads. Exactly one writer holds authority over the
//! panel-controlled slots at a time, while exit progress always belongs to the
//! timeline.

use glam::Mat4;

use crate::shader_graph::Uniform;

/// A party allowed to write plane uniforms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum UniformWriter {
    /// The animation driver's timelines.
    #[default]
    Timeline,
    /// The debug control panel.
    Panel,
}

/// Current values of a plane's uniform scalars.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UniformSet {
    reveal: f32,
    enter_progress: f32,
    exit_progress: f32,
    blurred: bool,
}

impl UniformSet {
    pub fn new(blurred: bool) -> Self {
        Self {
            blurred,
            ..Default::default()
        }
    }

    /// Value of a slot as a float; the blur flag reads as 0 or 1.
    pub fn get(&self, slot: Uniform) -> f32 {
        match slot {
            Uniform::Reveal => self.reveal,
            Uniform::EnterProgress => self.enter_progress,
            Uniform::ExitProgress => self.exit_progress,
            Uniform::IsBlurred => {
                if self.blurred {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    pub fn reveal(&self) -> f32 {
        self.reveal
    }

    pub fn enter_progress(&self) -> f32 {
        self.enter_progress
    }

    pub fn exit_progress(&self) -> f32 {
        self.exit_progress
    }

    pub fn is_blurred(&self) -> bool {
        self.blurred
    }

    /// Builder-style setter used by tests and one-off evaluations.
    pub fn with(mut self, slot: Uniform, value: f32) -> Self {
        self.store(slot, value);
        self
    }

    fn store(&mut self, slot: Uniform, value: f32) {
        let value = if value.is_finite() {
            value.clamp(0.0, 1.0)
        } else {
            0.0
        };
        match slot {
            Uniform::Reveal => self.reveal = value,
            Uniform::EnterProgress => self.enter_progress = value,
            Uniform::ExitProgress => self.exit_progress = value,
            Uniform::IsBlurred => self.blurred = value >= 0.5,
        }
    }

    /// Pack the uniforms with the plane's transforms for upload.
    pub fn block(&self, view_proj: Mat4, model: Mat4) -> PlaneUniformBlock {
        PlaneUniformBlock {
            view_proj: view_proj.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            reveal: self.reveal,
            enter_progress: self.enter_progress,
            exit_progress: self.exit_progress,
            is_blurred: self.get(Uniform::IsBlurred),
        }
    }
}

/// GPU layout of `PlaneUniforms` in the generated WGSL.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PlaneUniformBlock {
    /// Camera view-projection matrix.
    pub view_proj: [[f32; 4]; 4],
    /// Plane model matrix (translation to the configured position).
    pub model: [[f32; 4]; 4],
    pub reveal: f32,
    pub enter_progress: f32,
    pub exit_progress: f32,
    /// Blur flag as 0.0 or 1.0; WGSL uniform blocks cannot hold `bool`.
    pub is_blurred: f32,
}

/// Owned-by-plane uniform storage with an explicit write authority.
#[derive(Clone, Debug, Default)]
pub struct UniformCell {
    values: UniformSet,
    authority: UniformWriter,
}

impl UniformCell {
    pub fn new(blurred: bool) -> Self {
        Self {
            values: UniformSet::new(blurred),
            authority: UniformWriter::Timeline,
        }
    }

    /// Snapshot for the renderer.
    pub fn read(&self) -> &UniformSet {
        &self.values
    }

    pub fn authority(&self) -> UniformWriter {
        self.authority
    }

    /// Move write authority over the panel-controlled slots.
    pub fn hand_over(&mut self, to: UniformWriter) {
        if self.authority != to {
            tracing::debug!(from = ?self.authority, ?to, "uniform authority changed");
            self.authority = to;
        }
    }

    /// Which writer may currently write `slot`.
    pub fn owner(&self, slot: Uniform) -> UniformWriter {
        match slot {
            Uniform::ExitProgress => UniformWriter::Timeline,
            _ => self.authority,
        }
    }

    /// Set the blur flag from the plane's config. This is configuration, not
    /// animation, so it ignores the current authority.
    pub fn set_blurred(&mut self, blurred: bool) {
        self.values.blurred = blurred;
    }

    /// Write a slot. Returns `false` and leaves the value untouched when
    /// `writer` does not hold authority over it.
    pub fn write(&mut self, writer: UniformWriter, slot: Uniform, value: f32) -> bool {
        if self.owner(slot) != writer {
            return false;
        }
        self.values.store(slot, value);
        true
    }
}
