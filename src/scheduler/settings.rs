use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the animation engine.
///
/// # Example
///
/// ```rust
/// use lumen::AnimationSettings;
///
/// let settings = AnimationSettings {
///     time_scale: 0.5,
///     ..Default::default()
/// };
/// assert_eq!(settings.max_steps_per_pass, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    /// Multiplier applied to every injected delta. Must be finite and `>= 0`.
    pub time_scale: f64,
    /// Upper bound on sub-steps in one event-driven pass
    pub max_steps_per_pass: usize,
    /// When set, ticks are reported but no animation advances
    pub paused: bool,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            max_steps_per_pass: 64,
            paused: false,
        }
    }
}

/// Configuration for a [`FrameScheduler`](super::FrameScheduler).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    pub animation: AnimationSettings,
    /// Frame deltas longer than this are clamped before reaching the
    /// animation engine (debugger stalls, window drags).
    pub max_frame_delta: Option<Duration>,
    /// Present frames that carried resource warnings
    pub present_with_warnings: bool,
    /// Split each frame at animation completion boundaries
    pub event_driven: bool,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            animation: AnimationSettings::default(),
            max_frame_delta: Some(Duration::from_millis(250)),
            present_with_warnings: true,
            event_driven: false,
        }
    }
}
