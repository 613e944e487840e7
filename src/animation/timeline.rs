use crate::shader_graph::Uniform;
use crate::uniforms::{UniformCell, UniformWriter};

use super::easing::Easing;
use super::tween::{ClockTween, FrameInput, ProgressDriver, ScrollScrub};

/// Seconds the mask takes to open.
pub const REVEAL_DURATION: f32 = 1.0;
/// Seconds the swing-in takes.
pub const ENTER_DURATION: f32 = 1.8;
/// How long the swing-in trails the reveal.
pub const ENTER_LAG: f32 = 0.2;

/// Holds at most one driver for one scalar.
///
/// Starting a new driver cancels and drops the previous one first, so two
/// drivers never write the same scalar.
#[derive(Default)]
pub struct Timeline {
    driver: Option<Box<dyn ProgressDriver>>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, driver: impl ProgressDriver + 'static) {
        self.clear();
        self.driver = Some(Box::new(driver));
    }

    /// Cancel and release the current driver, if any.
    pub fn clear(&mut self) {
        if let Some(mut driver) = self.driver.take() {
            driver.cancel();
        }
    }

    /// True while a live driver is attached.
    pub fn is_active(&self) -> bool {
        self.driver.as_ref().is_some_and(|d| !d.is_cancelled())
    }

    pub fn is_finished(&self) -> bool {
        self.driver.as_ref().is_none_or(|d| d.is_finished())
    }

    pub fn current(&self) -> Option<f32> {
        self.driver.as_ref().map(|d| d.current())
    }

    /// Advance the driver; `None` when there is nothing live to write.
    pub fn step(&mut self, frame: &FrameInput) -> Option<f32> {
        let driver = self.driver.as_mut()?;
        if driver.is_cancelled() {
            return None;
        }
        Some(driver.step(frame))
    }
}

impl std::fmt::Debug for Timeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timeline")
            .field("active", &self.is_active())
            .field("current", &self.current())
            .finish()
    }
}

/// The three timelines of one plane.
///
/// Reveal and enter are clock-driven and restart on replay; exit follows the
/// scroll position for the plane's whole life.
#[derive(Debug)]
pub struct PlaneAnimator {
    delay: f32,
    reveal: Timeline,
    enter: Timeline,
    exit: Timeline,
}

impl PlaneAnimator {
    pub fn new(delay: f32) -> Self {
        let mut exit = Timeline::new();
        exit.start(ScrollScrub::new(delay));
        Self {
            delay,
            reveal: Timeline::new(),
            enter: Timeline::new(),
            exit,
        }
    }

    pub fn delay(&self) -> f32 {
        self.delay
    }

    /// (Re)start reveal and enter from 0, counting delays from `now`.
    pub fn start(&mut self, now: f32) {
        self.reveal.start(
            ClockTween::new(0.0, 1.0, REVEAL_DURATION)
                .delay(self.delay)
                .easing(Easing::EaseOut)
                .starting_at(now),
        );
        self.enter.start(
            ClockTween::new(0.0, 1.0, ENTER_DURATION)
                .delay(self.delay + ENTER_LAG)
                .easing(Easing::EaseOut)
                .starting_at(now),
        );
    }

    /// Stop the clock-driven timelines, leaving their scalars where they are.
    pub fn cancel_clock(&mut self) {
        self.reveal.clear();
        self.enter.clear();
    }

    /// Release everything; nothing is written after this.
    pub fn unmount(&mut self) {
        self.cancel_clock();
        self.exit.clear();
    }

    pub fn is_running(&self) -> bool {
        !(self.reveal.is_finished() && self.enter.is_finished())
    }

    /// Advance every timeline and write the results into `cell`.
    pub fn update(&mut self, frame: &FrameInput, cell: &mut UniformCell) {
        for (timeline, slot) in [
            (&mut self.reveal, Uniform::Reveal),
            (&mut self.enter, Uniform::EnterProgress),
            (&mut self.exit, Uniform::ExitProgress),
        ] {
            if let Some(value) = timeline.step(frame) {
                cell.write(UniformWriter::Timeline, slot, value);
            }
        }
    }
}

impl Drop for PlaneAnimator {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(elapsed: f32) -> FrameInput {
        FrameInput {
            elapsed,
            ..Default::default()
        }
    }

    #[test]
    fn starting_replaces_the_previous_driver() {
        let mut timeline = Timeline::new();
        timeline.start(ClockTween::new(0.0, 1.0, 1.0));
        timeline.step(&at(0.5));
        timeline.start(ClockTween::new(0.0, 0.25, 1.0).starting_at(0.5));
        assert_eq!(timeline.step(&at(2.0)), Some(0.25));
    }

    #[test]
    fn cleared_timeline_writes_nothing() {
        let mut timeline = Timeline::new();
        timeline.start(ClockTween::new(0.0, 1.0, 1.0));
        timeline.clear();
        assert!(!timeline.is_active());
        assert_eq!(timeline.step(&at(0.5)), None);
    }

    #[test]
    fn reveal_and_enter_follow_their_delays() {
        let mut animator = PlaneAnimator::new(0.5);
        let mut cell = UniformCell::new(false);
        animator.start(0.0);

        animator.update(&at(0.5), &mut cell);
        assert_eq!(cell.read().reveal(), 0.0);
        animator.update(&at(1.0), &mut cell);
        assert_eq!(cell.read().reveal(), 0.75);
        let expected_enter = Easing::EaseOut.apply(0.3 / ENTER_DURATION);
        assert!((cell.read().enter_progress() - expected_enter).abs() < 1e-5);

        animator.update(&at(2.5), &mut cell);
        assert_eq!(cell.read().reveal(), 1.0);
        assert_eq!(cell.read().enter_progress(), 1.0);
        assert!(!animator.is_running());
    }

    #[test]
    fn replay_resets_to_zero() {
        let mut animator = PlaneAnimator::new(0.0);
        let mut cell = UniformCell::new(false);
        animator.start(0.0);
        animator.update(&at(5.0), &mut cell);
        assert_eq!(cell.read().reveal(), 1.0);

        animator.start(5.0);
        animator.update(&at(5.0), &mut cell);
        assert_eq!(cell.read().reveal(), 0.0);
        assert_eq!(cell.read().enter_progress(), 0.0);
        assert!(animator.is_running());
    }

    #[test]
    fn exit_ignores_the_clock_and_replay() {
        let mut animator = PlaneAnimator::new(0.0);
        let mut cell = UniformCell::new(false);
        let frame = FrameInput {
            elapsed: 1.0,
            dt: 0.0,
            scroll: 0.25,
        };
        animator.update(&frame, &mut cell);
        assert_eq!(cell.read().exit_progress(), 0.25);
        animator.start(1.0);
        animator.update(&frame, &mut cell);
        assert_eq!(cell.read().exit_progress(), 0.25);
    }

    #[test]
    fn unmount_stops_all_writes() {
        let mut animator = PlaneAnimator::new(0.0);
        let mut cell = UniformCell::new(false);
        animator.start(0.0);
        animator.unmount();
        let frame = FrameInput {
            elapsed: 10.0,
            dt: 0.0,
            scroll: 1.0,
        };
        animator.update(&frame, &mut cell);
        assert_eq!(*cell.read(), crate::uniforms::UniformSet::new(false));
    }
}
