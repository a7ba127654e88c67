//! Animation clock: monotonic elapsed time fed to the frame updater.
//!
//! Wall-clock gaps longer than [`MAX_FRAME_TIME`] (window dragged, debugger
//! paused, laptop asleep) are clamped so the planets do not jump ahead.

use std::time::Instant;
use tracing::warn;

/// Longest frame gap that is counted in full.
pub const MAX_FRAME_TIME: f64 = 0.25;

/// Tracks animation time across frames.
pub struct FrameClock {
    previous_time: Instant,
    elapsed: f64,
    frame_count: u64,
}

impl FrameClock {
    /// Start at `t = 0` from the current instant.
    pub fn new() -> Self {
        Self {
            previous_time: Instant::now(),
            elapsed: 0.0,
            frame_count: 0,
        }
    }

    /// Measure the time since the previous tick and return the new elapsed time.
    pub fn tick(&mut self) -> f64 {
        let now = Instant::now();
        let frame_time = now.duration_since(self.previous_time).as_secs_f64();
        self.previous_time = now;
        self.advance(frame_time)
    }

    /// Add `frame_time` seconds (clamped to `[0, MAX_FRAME_TIME]`) and return
    /// the new elapsed time.
    pub fn advance(&mut self, frame_time: f64) -> f64 {
        let mut frame_time = frame_time.max(0.0);
        if frame_time > MAX_FRAME_TIME {
            warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                frame_time * 1000.0,
                MAX_FRAME_TIME * 1000.0
            );
            frame_time = MAX_FRAME_TIME;
        }
        self.elapsed += frame_time;
        self.frame_count += 1;
        self.elapsed
    }

    /// Animation time in seconds.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Number of ticks so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
