//! Progress drivers: things that produce a `[0, 1]`-ish scalar each frame.

use super::easing::Easing;

/// What a driver gets to look at each frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameInput {
    /// Seconds since the ticker started.
    pub elapsed: f32,
    /// Seconds since the previous frame.
    pub dt: f32,
    /// Normalized scroll position, 0 at the top and 1 at the bottom.
    pub scroll: f32,
}

/// A source of one animated scalar.
///
/// A cancelled driver is inert: `step` no longer changes its value, and the
/// [`super::Timeline`] holding it stops writing.
pub trait ProgressDriver {
    /// Latest value.
    fn current(&self) -> f32;

    /// Stop for good.
    fn cancel(&mut self);

    fn is_cancelled(&self) -> bool;

    /// Advance to `frame` and return the new value.
    fn step(&mut self, frame: &FrameInput) -> f32;

    /// Whether further steps would leave the value unchanged.
    fn is_finished(&self) -> bool {
        self.is_cancelled()
    }
}

/// Clock-driven interpolation from `from` to `to`.
///
/// Holds `from` until `delay` seconds after `start`, then eases to `to`
/// over `duration` seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct ClockTween {
    from: f32,
    to: f32,
    duration: f32,
    delay: f32,
    easing: Easing,
    start: f32,
    value: f32,
    finished: bool,
    cancelled: bool,
}

impl ClockTween {
    pub fn new(from: f32, to: f32, duration: f32) -> Self {
        Self {
            from,
            to,
            duration: duration.max(0.0),
            delay: 0.0,
            easing: Easing::Linear,
            start: 0.0,
            value: from,
            finished: false,
            cancelled: false,
        }
    }

    pub fn delay(mut self, delay: f32) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Ticker time the tween counts from.
    pub fn starting_at(mut self, elapsed: f32) -> Self {
        self.start = elapsed;
        self
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    fn progress_at(&self, elapsed: f32) -> f32 {
        let local = elapsed - self.start - self.delay;
        if local <= 0.0 {
            0.0
        } else if self.duration == 0.0 {
            1.0
        } else {
            (local / self.duration).min(1.0)
        }
    }
}

impl ProgressDriver for ClockTween {
    fn current(&self) -> f32 {
        self.value
    }

    fn cancel(&mut self) {
        self.cancelled = true;
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    fn step(&mut self, frame: &FrameInput) -> f32 {
        if self.cancelled || self.finished {
            return self.value;
        }
        let progress = self.progress_at(frame.elapsed);
        self.value = if progress >= 1.0 {
            self.finished = true;
            self.to
        } else {
            self.from + (self.to - self.from) * self.easing.apply(progress)
        };
        self.value
    }

    fn is_finished(&self) -> bool {
        self.cancelled || self.finished
    }
}

/// Linear map from the scroll position onto `[0, 1]`.
///
/// Behaves like a scrubbed timeline holding `delay` seconds of nothing and
/// then a `duration`-second linear tween, with the whole timeline stretched
/// over the scroll range. Stays pinned at 0 until the scroll passes
/// `delay / (delay + duration)`.
#[derive(Clone, Debug, PartialEq)]
pub struct ScrollScrub {
    delay: f32,
    duration: f32,
    value: f32,
    cancelled: bool,
}

impl ScrollScrub {
    /// Length of the scrubbed tween once the delay has passed.
    pub const DURATION: f32 = 0.5;

    pub fn new(delay: f32) -> Self {
        Self {
            delay: delay.max(0.0),
            duration: Self::DURATION,
            value: 0.0,
            cancelled: false,
        }
    }

    /// Scroll fraction below which the output stays at 0.
    pub fn threshold(&self) -> f32 {
        self.delay / (self.delay + self.duration)
    }

    pub fn map(&self, scroll: f32) -> f32 {
        let scroll = scroll.clamp(0.0, 1.0);
        ((scroll * (self.delay + self.duration) - self.delay) / self.duration).clamp(0.0, 1.0)
    }
}

impl ProgressDriver for ScrollScrub {
    fn current(&self) -> f32 {
        self.value
    }

    fn cancel(&mut self) {
        self.cancelled = true;
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    fn step(&mut self, frame: &FrameInput) -> f32 {
        if !self.cancelled {
            self.value = self.map(frame.scroll);
        }
        self.value
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

    fn scrolled(scroll: f32) -> FrameInput {
        FrameInput {
            scroll,
            ..Default::default()
        }
    }

    #[test]
    fn holds_start_value_through_delay() {
        let mut tween = ClockTween::new(0.0, 1.0, 1.0).delay(0.5).starting_at(2.0);
        assert_eq!(tween.current(), 0.0);
        assert_eq!(tween.step(&at(2.4)), 0.0);
        assert!(tween.step(&at(2.75)) > 0.0);
    }

    #[test]
    fn eases_and_lands_exactly_on_target() {
        let mut tween = ClockTween::new(0.0, 1.0, 1.0).easing(Easing::EaseOut);
        assert_eq!(tween.step(&at(0.5)), 0.75);
        assert!(!tween.is_finished());
        assert_eq!(tween.step(&at(1.7)), 1.0);
        assert!(tween.is_finished());
        assert_eq!(tween.step(&at(0.1)), 1.0);
    }

    #[test]
    fn cancelled_tween_freezes() {
        let mut tween = ClockTween::new(0.0, 1.0, 1.0);
        tween.step(&at(0.25));
        tween.cancel();
        assert_eq!(tween.step(&at(0.9)), 0.25);
        assert!(tween.is_cancelled());
    }

    #[test]
    fn zero_duration_jumps_after_delay() {
        let mut tween = ClockTween::new(0.0, 1.0, 0.0).delay(1.0);
        assert_eq!(tween.step(&at(0.5)), 0.0);
        assert_eq!(tween.step(&at(1.5)), 1.0);
    }

    #[test]
    fn scrub_is_pinned_until_threshold() {
        let mut scrub = ScrollScrub::new(0.5);
        assert_eq!(scrub.threshold(), 0.5);
        assert_eq!(scrub.step(&scrolled(0.3)), 0.0);
        assert_eq!(scrub.step(&scrolled(0.5)), 0.0);
        assert_eq!(scrub.step(&scrolled(0.75)), 0.5);
        assert_eq!(scrub.step(&scrolled(1.0)), 1.0);
    }

    #[test]
    fn scrub_without_delay_follows_scroll() {
        let mut scrub = ScrollScrub::new(0.0);
        assert_eq!(scrub.step(&scrolled(0.25)), 0.25);
        // Scrolling back reverses the exit.
        assert_eq!(scrub.step(&scrolled(0.0)), 0.0);
    }

    #[test]
    fn drivers_share_one_interface() {
        let mut drivers: Vec<Box<dyn ProgressDriver>> = vec![
            Box::new(ClockTween::new(0.0, 1.0, 1.0)),
            Box::new(ScrollScrub::new(0.0)),
        ];
        let frame = FrameInput {
            elapsed: 2.0,
            dt: 0.016,
            scroll: 1.0,
        };
        for driver in &mut drivers {
            assert_eq!(driver.step(&frame), 1.0);
        }
    }
}
