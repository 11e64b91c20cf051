use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
pub use std::time::Instant;

#[cfg(target_arch = "wasm32")]
pub use web_time::Instant;

/// Wall-clock frame timer for hosts.
///
/// The animation engine never reads the clock itself; hosts sample a
/// `FrameClock` and inject the delta.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start_time: Instant,
    last_tick: Instant,
    /// Time between the last two ticks
    pub delta: Duration,
    /// Total number of ticks
    pub frame_count: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    #[must_use]
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start_time: now,
            last_tick: now,
            delta: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Samples the clock and returns the time since the previous tick.
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        self.delta = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;
        self.frame_count += 1;
        self.delta
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.last_tick.saturating_duration_since(self.start_time)
    }
}

/// Frames-per-second over one-second windows.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    frame_count: u32,
    accumulated: Duration,
    pub current_fps: f32,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl FpsCounter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            frame_count: 0,
            accumulated: Duration::ZERO,
            current_fps: 0.0,
        }
    }

    /// Records one frame of length `delta`. Returns the new rate whenever a
    /// window closes.
    pub fn record(&mut self, delta: Duration) -> Option<f32> {
        self.frame_count += 1;
        self.accumulated += delta;

        if self.accumulated >= Duration::from_secs(1) {
            self.current_fps = self.frame_count as f32 / self.accumulated.as_secs_f32();
            self.accumulated = Duration::ZERO;
            self.frame_count = 0;
            return Some(self.current_fps);
        }
        None
    }
}
