//! Fixed-timestep scheduler
//!
//! Wall-clock frame deltas feed an accumulator that is drained in fixed
//! `SIM_DT_MS` steps. Any remainder carries into the next frame.

use crate::consts::{MAX_FRAME_DELTA_MS, SIM_DT_MS};

/// Per-frame bookkeeping returned to the caller
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTiming {
    /// Wall-clock delta consumed this frame (after clamping)
    pub delta_ms: f64,
    /// Physics steps executed
    pub steps: u32,
    /// FPS sample refreshed this frame
    pub fps_updated: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FixedStepScheduler {
    accumulator: f64,
    last_time: Option<f64>,
    fps: u32,
    frame_count: u32,
    fps_last_checked: f64,
}

impl FixedStepScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent FPS sample (0 until one second has elapsed)
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Time carried over to the next frame
    pub fn accumulator_ms(&self) -> f64 {
        self.accumulator
    }

    /// Forget the previous timestamp and any carried time
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.last_time = None;
        self.frame_count = 0;
    }

    /// Process one rendered frame at `timestamp_ms`, running `step` zero or more times
    pub fn frame<F: FnMut(f32)>(&mut self, timestamp_ms: f64, mut step: F) -> FrameTiming {
        let mut timing = FrameTiming::default();

        let delta = match self.last_time {
            Some(last) if timestamp_ms.is_finite() => {
                (timestamp_ms - last).clamp(0.0, MAX_FRAME_DELTA_MS)
            }
            _ => {
                self.fps_last_checked = timestamp_ms;
                0.0
            }
        };
        if timestamp_ms.is_finite() {
            self.last_time = Some(timestamp_ms);
        }
        timing.delta_ms = delta;

        self.frame_count += 1;
        let elapsed = timestamp_ms - self.fps_last_checked;
        if elapsed >= 1000.0 {
            self.fps = (self.frame_count as f64 * 1000.0 / elapsed).round() as u32;
            self.frame_count = 0;
            self.fps_last_checked = timestamp_ms;
            timing.fps_updated = true;
        }

        self.accumulator += delta;
        let fixed = SIM_DT_MS as f64;
        while self.accumulator >= fixed {
            step(SIM_DT_MS);
            self.accumulator -= fixed;
            timing.steps += 1;
        }

        timing
    }
}
