//! Animations that do not write a property: waits, callbacks and
//! externally completed animations.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::animation::engine::{AdvanceOutcome, Animation, AnimationDuration, AnimationState};
use crate::animation::target::TargetId;

/// Elapsed-time bookkeeping for fixed-duration animations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Timeline {
    pub(crate) duration: Duration,
    pub(crate) elapsed: Duration,
    pub(crate) state: AnimationState,
}

impl Timeline {
    pub(crate) fn new(duration: Duration) -> Self {
        Self {
            duration,
            elapsed: Duration::ZERO,
            state: AnimationState::Running,
        }
    }

    /// Elapsed never exceeds the duration; the excess is reported as unused.
    pub(crate) fn advance(&mut self, delta: Duration) -> AdvanceOutcome {
        if self.state == AnimationState::Finished {
            return AdvanceOutcome::finished(delta);
        }
        let total = self.elapsed.saturating_add(delta);
        if total >= self.duration {
            self.elapsed = self.duration;
            self.state = AnimationState::Finished;
            AdvanceOutcome::finished(total - self.duration)
        } else {
            self.elapsed = total;
            AdvanceOutcome::running()
        }
    }

    /// Linear progress in `[0, 1]`. A zero duration counts as complete.
    pub(crate) fn fraction(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0) as f32
    }
}

/// Does nothing for a fixed time. Used as a delay in sequences.
#[derive(Debug, Clone)]
pub struct WaitAnimation {
    timeline: Timeline,
    target: Option<TargetId>,
}

impl WaitAnimation {
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            timeline: Timeline::new(duration),
            target: None,
        }
    }

    /// Associates the wait with a target so that `cancel_target` removes it.
    #[must_use]
    pub fn for_target(mut self, target: TargetId) -> Self {
        self.target = Some(target);
        self
    }
}

impl Animation for WaitAnimation {
    fn target(&self) -> Option<TargetId> {
        self.target
    }

    fn duration(&self) -> AnimationDuration {
        AnimationDuration::Fixed(self.timeline.duration)
    }

    fn elapsed(&self) -> Duration {
        self.timeline.elapsed
    }

    fn state(&self) -> AnimationState {
        self.timeline.state
    }

    fn advance(&mut self, delta: Duration) -> AdvanceOutcome {
        self.timeline.advance(delta)
    }

    fn label(&self) -> &str {
        "Wait"
    }
}

/// Runs a closure once, on its first tick, and finishes immediately.
pub struct CallbackAnimation {
    callback: Option<Box<dyn FnOnce() + Send>>,
}

impl CallbackAnimation {
    pub fn new(callback: impl FnOnce() + Send + 'static) -> Self {
        Self {
            callback: Some(Box::new(callback)),
        }
    }
}

impl Animation for CallbackAnimation {
    fn duration(&self) -> AnimationDuration {
        AnimationDuration::Fixed(Duration::ZERO)
    }

    fn elapsed(&self) -> Duration {
        Duration::ZERO
    }

    fn state(&self) -> AnimationState {
        if self.callback.is_some() {
            AnimationState::Running
        } else {
            AnimationState::Finished
        }
    }

    fn advance(&mut self, delta: Duration) -> AdvanceOutcome {
        if let Some(callback) = self.callback.take() {
            callback();
        }
        AdvanceOutcome::finished(delta)
    }

    fn label(&self) -> &str {
        "Callback"
    }
}

impl fmt::Debug for CallbackAnimation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackAnimation")
            .field("pending", &self.callback.is_some())
            .finish()
    }
}

/// Event-driven animation that finishes once `condition` returns `true`.
///
/// The condition is polled before and after each delta is consumed. When it
/// already holds at the start of a tick the whole delta is passed on as
/// unused.
pub struct WaitUntilAnimation {
    condition: Box<dyn FnMut() -> bool + Send>,
    elapsed: Duration,
    state: AnimationState,
    target: Option<TargetId>,
}

impl WaitUntilAnimation {
    pub fn new(condition: impl FnMut() -> bool + Send + 'static) -> Self {
        Self {
            condition: Box::new(condition),
            elapsed: Duration::ZERO,
            state: AnimationState::Running,
            target: None,
        }
    }

    #[must_use]
    pub fn for_target(mut self, target: TargetId) -> Self {
        self.target = Some(target);
        self
    }
}

impl Animation for WaitUntilAnimation {
    fn target(&self) -> Option<TargetId> {
        self.target
    }

    fn duration(&self) -> AnimationDuration {
        AnimationDuration::EventDriven
    }

    fn elapsed(&self) -> Duration {
        self.elapsed
    }

    fn state(&self) -> AnimationState {
        self.state
    }

    fn advance(&mut self, delta: Duration) -> AdvanceOutcome {
        if self.state == AnimationState::Finished {
            return AdvanceOutcome::finished(delta);
        }
        if (self.condition)() {
            self.state = AnimationState::Finished;
            return AdvanceOutcome::finished(delta);
        }
        self.elapsed = self.elapsed.saturating_add(delta);
        if (self.condition)() {
            self.state = AnimationState::Finished;
            return AdvanceOutcome::finished(Duration::ZERO);
        }
        AdvanceOutcome::running()
    }

    fn label(&self) -> &str {
        "WaitUntil"
    }
}

impl fmt::Debug for WaitUntilAnimation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitUntilAnimation")
            .field("elapsed", &self.elapsed)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Shared flag used to complete a [`SignalAnimation`] from outside the engine.
#[derive(Debug, Clone, Default)]
pub struct CompletionSignal(Arc<AtomicBool>);

impl CompletionSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_signaled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Creates an animation waiting on this signal.
    #[must_use]
    pub fn animation(&self) -> SignalAnimation {
        SignalAnimation::new(self.clone())
    }
}

/// Event-driven animation completed by a [`CompletionSignal`].
#[derive(Debug, Clone)]
pub struct SignalAnimation {
    signal: CompletionSignal,
    elapsed: Duration,
    state: AnimationState,
    target: Option<TargetId>,
}

impl SignalAnimation {
    #[must_use]
    pub fn new(signal: CompletionSignal) -> Self {
        Self {
            signal,
            elapsed: Duration::ZERO,
            state: AnimationState::Running,
            target: None,
        }
    }

    #[must_use]
    pub fn for_target(mut self, target: TargetId) -> Self {
        self.target = Some(target);
        self
    }
}

impl Animation for SignalAnimation {
    fn target(&self) -> Option<TargetId> {
        self.target
    }

    fn duration(&self) -> AnimationDuration {
        AnimationDuration::EventDriven
    }

    fn elapsed(&self) -> Duration {
        self.elapsed
    }

    fn state(&self) -> AnimationState {
        self.state
    }

    fn advance(&mut self, delta: Duration) -> AdvanceOutcome {
        if self.state == AnimationState::Finished || self.signal.is_signaled() {
            self.state = AnimationState::Finished;
            return AdvanceOutcome::finished(delta);
        }
        self.elapsed = self.elapsed.saturating_add(delta);
        AdvanceOutcome::running()
    }

    fn label(&self) -> &str {
        "Signal"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn timeline_reports_overshoot() {
        let mut timeline = Timeline::new(Duration::from_millis(100));
        assert_eq!(timeline.advance(Duration::from_millis(60)), AdvanceOutcome::running());
        let outcome = timeline.advance(Duration::from_millis(60));
        assert_eq!(outcome, AdvanceOutcome::finished(Duration::from_millis(20)));
        assert_eq!(timeline.elapsed, Duration::from_millis(100));
    }

    #[test]
    fn zero_duration_finishes_on_first_tick() {
        let mut wait = WaitAnimation::new(Duration::ZERO);
        assert_eq!(wait.progress(), Some(0.0));
        assert!(wait.advance(Duration::ZERO).is_finished());
        assert_eq!(wait.progress(), Some(1.0));
    }

    #[test]
    fn callback_runs_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut anim = CallbackAnimation::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(anim.state(), AnimationState::Running);
        anim.advance(Duration::from_millis(5));
        anim.advance(Duration::from_millis(5));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(anim.state(), AnimationState::Finished);
    }

    #[test]
    fn wait_until_polls_condition() {
        let flag = Arc::new(AtomicBool::new(false));
        let probe = Arc::clone(&flag);
        let mut anim = WaitUntilAnimation::new(move || probe.load(Ordering::SeqCst));

        assert!(!anim.advance(Duration::from_millis(10)).is_finished());
        assert_eq!(anim.progress(), None);
        assert_eq!(anim.time_to_next_event(), None);

        flag.store(true, Ordering::SeqCst);
        let outcome = anim.advance(Duration::from_millis(10));
        assert_eq!(outcome, AdvanceOutcome::finished(Duration::from_millis(10)));
        assert_eq!(anim.elapsed(), Duration::from_millis(10));
    }

    #[test]
    fn signal_completes_animation() {
        let signal = CompletionSignal::new();
        let mut anim = signal.animation();
        assert!(!anim.advance(Duration::from_millis(16)).is_finished());
        signal.signal();
        assert!(anim.advance(Duration::from_millis(16)).is_finished());
    }
}
