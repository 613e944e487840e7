//! Animation of the per-plane uniform scalars.
//!
//! - [`Ticker`]: the one clock read per frame
//! - [`ProgressDriver`]: shared interface of [`ClockTween`] and [`ScrollScrub`]
//! - [`Timeline`]: a slot holding at most one driver
//! - [`PlaneAnimator`]: a plane's reveal, enter and exit timelines
//! - [`ScrollTracker`]: normalized scroll position fed to exit timelines

mod easing;
mod scroll;
mod ticker;
mod timeline;
mod tween;

pub use easing::Easing;
pub use scroll::ScrollTracker;
pub use ticker::{LAG_STEP, LAG_THRESHOLD, Ticker};
pub use timeline::{ENTER_DURATION, ENTER_LAG, PlaneAnimator, REVEAL_DURATION, Timeline};
pub use tween::{ClockTween, FrameInput, ProgressDriver, ScrollScrub};
