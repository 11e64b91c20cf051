//! Animation engine.
//!
//! The engine owns the active animations and advances them by injected time
//! only. All animations active in a tick are advanced in insertion order, so
//! two animations writing the same property resolve the same way every run.

use std::time::Duration;

use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;

use crate::animation::diagnostics::{EventDrivenPassInfo, EventDrivenStepInfo};
use crate::animation::target::TargetId;
use crate::errors::{LumenError, Result};
use crate::scheduler::settings::AnimationSettings;
use crate::utils::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationDuration {
    Fixed(Duration),
    /// Completes when an external condition is met.
    EventDriven,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AnimationState {
    #[default]
    Running,
    Finished,
}

/// What one call to [`Animation::advance`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceOutcome {
    pub state: AnimationState,
    /// Part of the delta not consumed because the animation finished
    pub unused: Duration,
}

impl AdvanceOutcome {
    #[inline]
    #[must_use]
    pub const fn running() -> Self {
        Self {
            state: AnimationState::Running,
            unused: Duration::ZERO,
        }
    }

    #[inline]
    #[must_use]
    pub const fn finished(unused: Duration) -> Self {
        Self {
            state: AnimationState::Finished,
            unused,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state == AnimationState::Finished
    }
}

/// A single animation driven by injected time.
///
/// Implementations must not read the wall clock. `advance` is never called
/// again once it has returned [`AnimationState::Finished`].
pub trait Animation: Send {
    /// Object this animation writes to, if any.
    fn target(&self) -> Option<TargetId> {
        None
    }

    fn duration(&self) -> AnimationDuration;

    fn elapsed(&self) -> Duration;

    fn state(&self) -> AnimationState;

    fn advance(&mut self, delta: Duration) -> AdvanceOutcome;

    /// Fraction of the fixed duration elapsed, `None` for event-driven animations.
    fn progress(&self) -> Option<f32> {
        match self.duration() {
            AnimationDuration::Fixed(duration) if duration.is_zero() => {
                Some(if self.state() == AnimationState::Finished { 1.0 } else { 0.0 })
            }
            AnimationDuration::Fixed(duration) => {
                Some((self.elapsed().as_secs_f64() / duration.as_secs_f64()).min(1.0) as f32)
            }
            AnimationDuration::EventDriven => None,
        }
    }

    /// Simulation time until this animation's next completion boundary.
    ///
    /// `None` means the animation cannot predict it (condition-driven).
    fn time_to_next_event(&self) -> Option<Duration> {
        match self.duration() {
            AnimationDuration::Fixed(duration) => Some(duration.saturating_sub(self.elapsed())),
            AnimationDuration::EventDriven => None,
        }
    }

    fn label(&self) -> &str {
        "Animation"
    }
}

new_key_type! {
    /// Handle to an animation owned by an [`AnimationEngine`].
    pub struct AnimationHandle;
}

pub struct AnimationEngine {
    animations: SlotMap<AnimationHandle, Box<dyn Animation>>,
    /// Insertion order of the live handles.
    order: Vec<AnimationHandle>,
    settings: AnimationSettings,
    /// Unscaled time injected since the time scale last changed.
    unscaled: Duration,
}

impl Default for AnimationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(AnimationSettings::default())
    }

    #[must_use]
    pub fn with_settings(settings: AnimationSettings) -> Self {
        Self {
            animations: SlotMap::with_key(),
            order: Vec::new(),
            settings,
            unscaled: Duration::ZERO,
        }
    }

    pub fn add_animation<A: Animation + 'static>(&mut self, animation: A) -> AnimationHandle {
        self.add_boxed(Box::new(animation))
    }

    pub fn add_boxed(&mut self, animation: Box<dyn Animation>) -> AnimationHandle {
        let handle = self.animations.insert(animation);
        self.order.push(handle);
        handle
    }

    /// Removes an animation mid-flight. Its target keeps the last applied value.
    pub fn cancel(&mut self, handle: AnimationHandle) -> bool {
        if self.animations.remove(handle).is_none() {
            return false;
        }
        self.order.retain(|h| *h != handle);
        true
    }

    /// Cancels every animation writing to `target`. Returns how many were removed.
    pub fn cancel_target(&mut self, target: TargetId) -> usize {
        let animations = &mut self.animations;
        let before = self.order.len();
        self.order.retain(|handle| {
            let matches = animations
                .get(*handle)
                .is_some_and(|a| a.target() == Some(target));
            if matches {
                animations.remove(*handle);
            }
            !matches
        });
        before - self.order.len()
    }

    pub fn clear(&mut self) {
        self.animations.clear();
        self.order.clear();
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, handle: AnimationHandle) -> bool {
        self.animations.contains_key(handle)
    }

    #[inline]
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.order.len()
    }

    #[inline]
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.order.is_empty()
    }

    #[must_use]
    pub fn progress(&self, handle: AnimationHandle) -> Option<f32> {
        self.animations.get(handle)?.progress()
    }

    #[must_use]
    pub fn state(&self, handle: AnimationHandle) -> Option<AnimationState> {
        self.animations.get(handle).map(|a| a.state())
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &AnimationSettings {
        &self.settings
    }

    pub fn set_time_scale(&mut self, time_scale: f64) -> Result<()> {
        if !time_scale.is_finite() || time_scale < 0.0 {
            return Err(LumenError::InvalidArgument(format!(
                "time scale must be finite and non-negative, got {time_scale}"
            )));
        }
        self.settings.time_scale = time_scale;
        self.unscaled = Duration::ZERO;
        Ok(())
    }

    pub fn pause(&mut self) {
        self.settings.paused = true;
    }

    pub fn resume(&mut self) {
        self.settings.paused = false;
    }

    #[inline]
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.settings.paused
    }

    /// Maps `elapsed` onto the scaled timeline.
    ///
    /// The scaled delta is the difference of the scaled running totals, so the
    /// scaled time after several deltas depends only on their sum.
    fn scaled(&mut self, elapsed: Duration) -> Duration {
        if self.settings.paused {
            return Duration::ZERO;
        }
        let scale = self.settings.time_scale;
        if (scale - 1.0).abs() < f64::EPSILON {
            return elapsed;
        }
        let before = scale_nanos(self.unscaled, scale);
        self.unscaled = self.unscaled.saturating_add(elapsed);
        let after = scale_nanos(self.unscaled, scale);
        Duration::from_nanos(u64::try_from(after.saturating_sub(before)).unwrap_or(u64::MAX))
    }

    /// Advances every active animation by `elapsed` (scaled by the time scale)
    /// and drops the ones that finished.
    pub fn advance_by_time(&mut self, elapsed: Duration) -> EventDrivenStepInfo {
        let delta = self.scaled(elapsed);
        self.step(delta)
    }

    /// Advances by `elapsed`, splitting it at every predicted completion
    /// boundary so that finished animations leave the set before the rest of
    /// the time is applied.
    ///
    /// The pass holds at most `max_steps_per_pass` steps; the last one absorbs
    /// whatever time remains.
    pub fn advance_event_driven(&mut self, elapsed: Duration) -> EventDrivenPassInfo {
        let max_steps = self.settings.max_steps_per_pass.max(1);
        let mut remaining = self.scaled(elapsed);
        let mut steps: SmallVec<[EventDrivenStepInfo; 4]> = SmallVec::new();

        loop {
            let last_allowed = steps.len() + 1 == max_steps;
            let next_event = if self.settings.paused {
                None
            } else {
                self.next_event()
            };

            let delta = match next_event {
                Some(next) if next < remaining && !last_allowed => next,
                Some(next) if next < remaining => {
                    log::warn!(
                        "Event-driven pass hit the {max_steps} step cap; \
                         applying {remaining:?} in one step"
                    );
                    remaining
                }
                _ => remaining,
            };

            steps.push(self.step(delta));
            remaining -= delta;

            if remaining.is_zero() || last_allowed {
                break;
            }
        }

        let pass = EventDrivenPassInfo::from_steps(steps);
        log::debug!(
            "Animation pass: {} steps, {} finished, {:?}",
            pass.count_steps(),
            pass.finished_count(),
            pass.total_time()
        );
        pass
    }

    fn next_event(&self) -> Option<Duration> {
        self.order
            .iter()
            .filter_map(|handle| self.animations.get(*handle))
            .filter_map(|a| a.time_to_next_event())
            .min()
    }

    fn step(&mut self, delta: Duration) -> EventDrivenStepInfo {
        let started = Instant::now();
        let animation_count = self.order.len();

        if self.settings.paused {
            return EventDrivenStepInfo {
                animation_count,
                finished_count: 0,
                simulated_time: Duration::ZERO,
                update_time: started.elapsed(),
            };
        }

        let mut finished_count = 0;
        for handle in &self.order {
            let Some(animation) = self.animations.get_mut(*handle) else {
                continue;
            };
            if animation.state() == AnimationState::Finished
                || animation.advance(delta).is_finished()
            {
                finished_count += 1;
            }
        }

        if finished_count > 0 {
            let animations = &mut self.animations;
            self.order.retain(|handle| {
                let running = animations
                    .get(*handle)
                    .is_some_and(|a| a.state() == AnimationState::Running);
                if !running {
                    animations.remove(*handle);
                }
                running
            });
        }

        EventDrivenStepInfo {
            animation_count,
            finished_count,
            simulated_time: delta,
            update_time: started.elapsed(),
        }
    }
}

fn scale_nanos(duration: Duration, scale: f64) -> u128 {
    (duration.as_nanos() as f64 * scale).floor() as u128
}

impl std::fmt::Debug for AnimationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationEngine")
            .field("active", &self.order.len())
            .field("settings", &self.settings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::builtin::WaitAnimation;

    #[test]
    fn finished_animations_leave_after_their_tick() {
        let mut engine = AnimationEngine::new();
        let handle = engine.add_animation(WaitAnimation::new(Duration::from_millis(10)));

        let step = engine.advance_by_time(Duration::from_millis(10));
        assert_eq!(step.animation_count, 1);
        assert_eq!(step.finished_count, 1);
        assert!(!engine.contains(handle));
        assert!(engine.is_idle());
    }

    #[test]
    fn paused_engine_reports_without_advancing() {
        let mut engine = AnimationEngine::new();
        let handle = engine.add_animation(WaitAnimation::new(Duration::from_millis(10)));
        engine.pause();

        let step = engine.advance_by_time(Duration::from_millis(50));
        assert_eq!(step.animation_count, 1);
        assert_eq!(step.simulated_time, Duration::ZERO);
        assert_eq!(engine.progress(handle), Some(0.0));

        engine.resume();
        engine.advance_by_time(Duration::from_millis(5));
        assert_eq!(engine.progress(handle), Some(0.5));
    }

    #[test]
    fn time_scale_validation() {
        let mut engine = AnimationEngine::new();
        assert!(engine.set_time_scale(-1.0).is_err());
        assert!(engine.set_time_scale(f64::NAN).is_err());
        assert!(engine.set_time_scale(2.0).is_ok());

        let handle = engine.add_animation(WaitAnimation::new(Duration::from_millis(100)));
        engine.advance_by_time(Duration::from_millis(25));
        let progress = engine.progress(handle).unwrap();
        assert!((progress - 0.5).abs() < 1e-6);
    }

    #[test]
    fn event_driven_pass_splits_at_completions() {
        let mut engine = AnimationEngine::new();
        engine.add_animation(WaitAnimation::new(Duration::from_millis(30)));
        engine.add_animation(WaitAnimation::new(Duration::from_millis(70)));

        let pass = engine.advance_event_driven(Duration::from_millis(100));
        assert_eq!(pass.count_steps(), 3);
        assert_eq!(pass.steps()[0].simulated_time, Duration::from_millis(30));
        assert_eq!(pass.steps()[1].simulated_time, Duration::from_millis(40));
        assert_eq!(pass.steps()[2].simulated_time, Duration::from_millis(30));
        assert_eq!(pass.simulated_time(), Duration::from_millis(100));
        assert_eq!(pass.finished_count(), 2);
    }

    #[test]
    fn step_cap_absorbs_remaining_time() {
        let mut engine = AnimationEngine::with_settings(AnimationSettings {
            max_steps_per_pass: 2,
            ..Default::default()
        });
        for ms in [10, 20, 30] {
            engine.add_animation(WaitAnimation::new(Duration::from_millis(ms)));
        }

        let pass = engine.advance_event_driven(Duration::from_millis(100));
        assert_eq!(pass.count_steps(), 2);
        assert_eq!(pass.simulated_time(), Duration::from_millis(100));
        assert!(engine.is_idle());
    }
}
