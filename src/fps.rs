//! Wall-clock frame-rate estimation.

use std::time::{Duration, Instant};

use crate::error::AnnotateError;

/// Integer frames-per-second figure, refreshed once per display interval.
///
/// Between refreshes the previous figure is returned unchanged so the overlay
/// does not flicker from frame to frame.
#[derive(Debug, Clone)]
pub struct FpsEstimator {
    frame_count: u64,
    interval_start: Instant,
    current_estimate: u32,
    display_interval: Duration,
}

impl FpsEstimator {
    /// Start measuring now.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotateError::InvalidInterval`] if `display_interval` is zero.
    pub fn new(display_interval: Duration) -> Result<Self, AnnotateError> {
        Self::start_at(display_interval, Instant::now())
    }

    /// Start measuring at `now`.
    pub fn start_at(display_interval: Duration, now: Instant) -> Result<Self, AnnotateError> {
        if display_interval.is_zero() {
            return Err(AnnotateError::InvalidInterval);
        }
        Ok(Self {
            frame_count: 0,
            interval_start: now,
            current_estimate: 0,
            display_interval,
        })
    }

    /// Account for one frame and return the current estimate.
    pub fn tick(&mut self) -> u32 {
        self.tick_at(Instant::now())
    }

    /// Account for one frame observed at `now`.
    ///
    /// When more than the display interval has passed since the last
    /// refresh, the estimate becomes `floor(frames / elapsed_seconds)` and
    /// counting restarts from this frame.
    pub fn tick_at(&mut self, now: Instant) -> u32 {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed > self.display_interval {
            let rate = self.frame_count as f64 / elapsed.as_secs_f64();
            self.current_estimate = rate.floor().min(u32::MAX as f64) as u32;
            self.interval_start = now;
            self.frame_count = 0;
        }
        self.frame_count += 1;
        self.current_estimate
    }

    /// The figure returned by the last tick (0 before the first refresh).
    pub fn current_estimate(&self) -> u32 {
        self.current_estimate
    }

    /// Frames counted since the last refresh.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn display_interval(&self) -> Duration {
        self.display_interval
    }
}
