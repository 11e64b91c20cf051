use std::time::Duration;

use smallvec::SmallVec;

/// Diagnostic record of one engine tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventDrivenStepInfo {
    /// Animations that were active when the tick started
    pub animation_count: usize,
    /// Animations that finished during the tick
    pub finished_count: usize,
    /// Simulation time fed to the animations (after time scaling)
    pub simulated_time: Duration,
    /// Wall-clock time spent computing the tick
    pub update_time: Duration,
}

/// Ordered record of the steps of one pass.
///
/// Built once when the pass completes and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventDrivenPassInfo {
    steps: SmallVec<[EventDrivenStepInfo; 4]>,
}

impl EventDrivenPassInfo {
    #[must_use]
    pub fn from_steps(steps: impl IntoIterator<Item = EventDrivenStepInfo>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
        }
    }

    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[EventDrivenStepInfo] {
        &self.steps
    }

    /// Sum of the wall-clock update times of all steps.
    #[must_use]
    pub fn total_time(&self) -> Duration {
        self.steps.iter().map(|s| s.update_time).sum()
    }

    #[inline]
    #[must_use]
    pub fn count_steps(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn simulated_time(&self) -> Duration {
        self.steps.iter().map(|s| s.simulated_time).sum()
    }

    #[must_use]
    pub fn finished_count(&self) -> usize {
        self.steps.iter().map(|s| s.finished_count).sum()
    }
}

impl From<EventDrivenStepInfo> for EventDrivenPassInfo {
    fn from(step: EventDrivenStepInfo) -> Self {
        Self::from_steps([step])
    }
}
