use std::time::Instant;

use super::tween::FrameInput;

/// Gaps longer than this are treated as a stall, not as animation time.
pub const LAG_THRESHOLD: f32 = 0.5;
/// Step used in place of a stalled gap.
pub const LAG_STEP: f32 = 1.0 / 30.0;

/// The single per-frame clock every timeline reads.
///
/// One `tick` per frame, before any animator runs, so every uniform written
/// for a frame sees the same time.
#[derive(Debug, Default)]
pub struct Ticker {
    last: Option<Instant>,
    elapsed: f32,
    dt: f32,
    frame: u64,
}

impl Ticker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance using the wall clock.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    pub fn tick_at(&mut self, now: Instant) {
        let dt = match self.last {
            Some(last) => now.saturating_duration_since(last).as_secs_f32(),
            None => 0.0,
        };
        self.last = Some(now);
        self.advance(dt);
    }

    /// Advance by a fixed step.
    pub fn advance(&mut self, dt: f32) {
        let dt = if dt > LAG_THRESHOLD {
            tracing::trace!(gap = dt, "frame stall smoothed");
            LAG_STEP
        } else {
            dt.max(0.0)
        };
        self.dt = dt;
        self.elapsed += dt;
        self.frame += 1;
    }

    /// Seconds of animation time since the first tick.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Number of ticks so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn frame_input(&self, scroll: f32) -> FrameInput {
        FrameInput {
            elapsed: self.elapsed,
            dt: self.dt,
            scroll,
        }
    }
}
