//! Frame clock for the render loop.
//!
//! ```ignore
//! use rainfall::time::Time;
//!
//! let mut time = Time::new();
//!
//! // Once per frame:
//! let dt = time.update();
//! particles.update(dt);
//! ```

use std::time::{Duration, Instant};

/// Frame timing: delta, elapsed time, frame count and a smoothed FPS value.
#[derive(Debug)]
pub struct Time {
    last_frame: Instant,
    elapsed_secs: f32,
    delta_secs: f32,
    real_delta_secs: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
    paused: bool,
    /// Fixed delta time for deterministic updates (optional).
    fixed_delta: Option<f32>,
}

impl Time {
    /// Create a new clock starting now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            real_delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            paused: false,
            fixed_delta: None,
        }
    }

    /// Create a clock that reports `delta` as the simulation step when set.
    /// `None` behaves like [`Time::new`].
    pub fn with_fixed_delta(delta: Option<f32>) -> Self {
        Self {
            fixed_delta: delta,
            ..Self::new()
        }
    }

    /// Advance the clock. Call once per frame.
    ///
    /// Returns the simulation delta: zero while paused, the fixed delta when
    /// one is set, otherwise the wall-clock time since the previous call.
    pub fn update(&mut self) -> f32 {
        let now = Instant::now();
        let raw_delta = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.real_delta_secs = raw_delta;
        self.frame_count += 1;

        self.delta_secs = if self.paused {
            0.0
        } else {
            self.fixed_delta.unwrap_or(raw_delta)
        };
        self.elapsed_secs += self.delta_secs;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        self.delta_secs
    }

    /// Simulated time in seconds, excluding pauses.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    /// Delta returned by the last [`update`](Self::update).
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Wall-clock time of the last frame, also while paused.
    #[inline]
    pub fn real_delta(&self) -> f32 {
        self.real_delta_secs
    }

    /// Frames since start, including paused ones.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Frames per second, refreshed twice a second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Whether the FPS value changed during the last update.
    #[inline]
    pub fn fps_refreshed(&self) -> bool {
        self.fps_frame_count == self.frame_count && self.frame_count > 0
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Toggle pause. While paused the delta is zero but frames still count.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}
