/// Native scroll position, the source of every exit timeline.
///
/// Wheel input moves a position inside `[0, extent]`; [`ScrollTracker::progress`]
/// is that position as a fraction of the extent.
#[derive(Clone, Debug, PartialEq)]
pub struct ScrollTracker {
    position: f32,
    extent: f32,
}

impl ScrollTracker {
    /// `extent` is the number of wheel lines from top to bottom.
    pub fn new(extent: f32) -> Self {
        Self {
            position: 0.0,
            extent: extent.max(0.0),
        }
    }

    /// Apply a wheel delta in lines. Positive `lines` scrolls up, as winit reports it.
    pub fn wheel(&mut self, lines: f32) {
        if lines.is_finite() {
            self.position = (self.position - lines).clamp(0.0, self.extent);
        }
    }

    pub fn set_progress(&mut self, progress: f32) {
        self.position = progress.clamp(0.0, 1.0) * self.extent;
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn extent(&self) -> f32 {
        self.extent
    }

    /// 0 at the top, 1 at the bottom. An empty range stays at 0.
    pub fn progress(&self) -> f32 {
        if self.extent > 0.0 {
            self.position / self.extent
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrolling_down_increases_progress() {
        let mut scroll = ScrollTracker::new(20.0);
        scroll.wheel(-5.0);
        assert_eq!(scroll.progress(), 0.25);
        scroll.wheel(2.0);
        assert_eq!(scroll.progress(), 0.15);
    }

    #[test]
    fn position_is_clamped_to_range() {
        let mut scroll = ScrollTracker::new(10.0);
        scroll.wheel(3.0);
        assert_eq!(scroll.position(), 0.0);
        scroll.wheel(-30.0);
        assert_eq!(scroll.progress(), 1.0);
    }

    #[test]
    fn empty_range_has_zero_progress() {
        let mut scroll = ScrollTracker::new(0.0);
        scroll.wheel(-3.0);
        assert_eq!(scroll.progress(), 0.0);
    }
}
