//! Composition of animations.
//!
//! [`AnimationSequence`] runs children one after another; [`AnimationGroup`]
//! runs them side by side. Both present themselves to the engine as a single
//! [`Animation`]. [`SequenceBuilder`] is the fluent front end.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use glam::{Quat, Vec2, Vec3};

use crate::animation::builtin::{
    CallbackAnimation, CompletionSignal, WaitAnimation, WaitUntilAnimation,
};
use crate::animation::easing::Easing;
use crate::animation::engine::{
    AdvanceOutcome, Animation, AnimationDuration, AnimationEngine, AnimationHandle, AnimationState,
};
use crate::animation::property::{
    Motion, Position, Position2D, Property, PropertyAnimation, RotationEuler, RotationQuaternion,
    Scaling,
};
use crate::animation::target::{
    Position2DTarget, PositionTarget, RotationEulerTarget, RotationQuaternionTarget, ScalingTarget,
    SharedTarget, TargetId,
};

/// Fixed durations of all children, or `None` if any child is event-driven.
fn fixed_durations(children: &[Box<dyn Animation>]) -> Option<Vec<Duration>> {
    children
        .iter()
        .map(|child| match child.duration() {
            AnimationDuration::Fixed(d) => Some(d),
            AnimationDuration::EventDriven => None,
        })
        .collect()
}

/// Ordered group: each child starts when the previous one finishes.
///
/// Time left over by a child finishing mid-tick is handed to the next child
/// in the same tick.
pub struct AnimationSequence {
    children: VecDeque<Box<dyn Animation>>,
    target: Option<TargetId>,
    duration: AnimationDuration,
    elapsed: Duration,
    state: AnimationState,
}

impl AnimationSequence {
    #[must_use]
    pub fn new(children: Vec<Box<dyn Animation>>, target: Option<TargetId>) -> Self {
        let duration = match fixed_durations(&children) {
            Some(parts) => AnimationDuration::Fixed(parts.into_iter().sum()),
            None => AnimationDuration::EventDriven,
        };
        Self {
            children: children.into(),
            target,
            duration,
            elapsed: Duration::ZERO,
            state: AnimationState::Running,
        }
    }

    /// Children not yet finished, including the one currently running.
    #[inline]
    #[must_use]
    pub fn remaining_children(&self) -> usize {
        self.children.len()
    }
}

impl Animation for AnimationSequence {
    fn target(&self) -> Option<TargetId> {
        self.target
    }

    fn duration(&self) -> AnimationDuration {
        self.duration
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

        let mut remaining = delta;
        while let Some(child) = self.children.front_mut() {
            let outcome = child.advance(remaining);
            if !outcome.is_finished() {
                self.elapsed = self.elapsed.saturating_add(remaining);
                return AdvanceOutcome::running();
            }
            self.elapsed = self.elapsed.saturating_add(remaining - outcome.unused);
            remaining = outcome.unused;
            self.children.pop_front();
        }

        self.state = AnimationState::Finished;
        AdvanceOutcome::finished(remaining)
    }

    fn time_to_next_event(&self) -> Option<Duration> {
        match self.children.front() {
            Some(child) => child.time_to_next_event(),
            None => Some(Duration::ZERO),
        }
    }

    fn label(&self) -> &str {
        "Sequence"
    }
}

impl fmt::Debug for AnimationSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationSequence")
            .field("remaining", &self.children.len())
            .field("duration", &self.duration)
            .field("elapsed", &self.elapsed)
            .field("state", &self.state)
            .finish()
    }
}

/// Parallel group: every child receives the same delta; the group finishes
/// with its last child.
pub struct AnimationGroup {
    children: Vec<Box<dyn Animation>>,
    target: Option<TargetId>,
    duration: AnimationDuration,
    elapsed: Duration,
    state: AnimationState,
}

impl AnimationGroup {
    #[must_use]
    pub fn new(children: Vec<Box<dyn Animation>>, target: Option<TargetId>) -> Self {
        let duration = match fixed_durations(&children) {
            Some(parts) => AnimationDuration::Fixed(parts.into_iter().max().unwrap_or_default()),
            None => AnimationDuration::EventDriven,
        };
        Self {
            children,
            target,
            duration,
            elapsed: Duration::ZERO,
            state: AnimationState::Running,
        }
    }
}

impl Animation for AnimationGroup {
    fn target(&self) -> Option<TargetId> {
        self.target
    }

    fn duration(&self) -> AnimationDuration {
        self.duration
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

        let mut any_running = false;
        let mut unused = delta;
        for child in &mut self.children {
            if child.state() == AnimationState::Finished {
                continue;
            }
            let outcome = child.advance(delta);
            if outcome.is_finished() {
                unused = unused.min(outcome.unused);
            } else {
                any_running = true;
            }
        }

        if any_running {
            self.elapsed = self.elapsed.saturating_add(delta);
            return AdvanceOutcome::running();
        }
        self.elapsed = self.elapsed.saturating_add(delta - unused);
        self.state = AnimationState::Finished;
        AdvanceOutcome::finished(unused)
    }

    fn time_to_next_event(&self) -> Option<Duration> {
        self.children
            .iter()
            .filter(|c| c.state() == AnimationState::Running)
            .filter_map(|c| c.time_to_next_event())
            .min()
    }

    fn label(&self) -> &str {
        "Group"
    }
}

impl fmt::Debug for AnimationGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationGroup")
            .field("children", &self.children.len())
            .field("duration", &self.duration)
            .field("state", &self.state)
            .finish()
    }
}

/// Fluent builder for animations on one target.
///
/// ```rust
/// use std::time::Duration;
/// use glam::Vec3;
/// use lumen::animation::{AnimationEngine, Easing, SequenceBuilder, SharedTarget, Transform3D};
///
/// let cube = SharedTarget::new(Transform3D::new());
/// let mut engine = AnimationEngine::new();
///
/// SequenceBuilder::new(cube.clone())
///     .easing(Easing::CubicOut)
///     .move_to(Vec3::new(0.0, 2.0, 0.0), Duration::from_millis(300))
///     .wait(Duration::from_millis(100))
///     .parallel(|p| p.scale_to(Vec3::splat(2.0), Duration::from_millis(200)))
///     .start(&mut engine);
///
/// engine.advance_by_time(Duration::from_millis(600));
/// assert_eq!(cube.lock().scaling, Vec3::splat(2.0));
/// ```
pub struct SequenceBuilder<T> {
    target: SharedTarget<T>,
    children: Vec<Box<dyn Animation>>,
    easing: Easing,
}

impl<T: Send + 'static> SequenceBuilder<T> {
    #[must_use]
    pub fn new(target: SharedTarget<T>) -> Self {
        Self {
            target,
            children: Vec::new(),
            easing: Easing::Linear,
        }
    }

    /// Easing used by the property steps added after this call.
    #[must_use]
    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Adds a step animating property `P`.
    #[must_use]
    pub fn animate<P: Property<T>>(mut self, motion: Motion<P::Value>, duration: Duration) -> Self {
        let animation = PropertyAnimation::<P, T>::new(self.target.clone(), motion, duration)
            .with_easing(self.easing);
        self.children.push(Box::new(animation));
        self
    }

    #[must_use]
    pub fn wait(mut self, duration: Duration) -> Self {
        let wait = WaitAnimation::new(duration).for_target(self.target.id());
        self.children.push(Box::new(wait));
        self
    }

    #[must_use]
    pub fn call(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.children.push(Box::new(CallbackAnimation::new(callback)));
        self
    }

    #[must_use]
    pub fn wait_until(mut self, condition: impl FnMut() -> bool + Send + 'static) -> Self {
        let wait = WaitUntilAnimation::new(condition).for_target(self.target.id());
        self.children.push(Box::new(wait));
        self
    }

    #[must_use]
    pub fn wait_for(mut self, signal: &CompletionSignal) -> Self {
        self.children
            .push(Box::new(signal.animation().for_target(self.target.id())));
        self
    }

    /// Appends an arbitrary animation.
    #[must_use]
    pub fn then(mut self, animation: impl Animation + 'static) -> Self {
        self.children.push(Box::new(animation));
        self
    }

    /// Appends a step whose parts run concurrently.
    #[must_use]
    pub fn parallel(mut self, build: impl FnOnce(Self) -> Self) -> Self {
        let inner = build(Self {
            target: self.target.clone(),
            children: Vec::new(),
            easing: self.easing,
        });
        let group = AnimationGroup::new(inner.children, Some(self.target.id()));
        self.children.push(Box::new(group));
        self
    }

    #[must_use]
    pub fn build(self) -> AnimationSequence {
        AnimationSequence::new(self.children, Some(self.target.id()))
    }

    /// Builds and adds the sequence to `engine`.
    pub fn start(self, engine: &mut AnimationEngine) -> AnimationHandle {
        engine.add_animation(self.build())
    }
}

impl<T: PositionTarget + Send + 'static> SequenceBuilder<T> {
    #[must_use]
    pub fn move_to(self, position: Vec3, duration: Duration) -> Self {
        self.animate::<Position>(Motion::To(position), duration)
    }

    #[must_use]
    pub fn move_by(self, offset: Vec3, duration: Duration) -> Self {
        self.animate::<Position>(Motion::By(offset), duration)
    }
}

impl<T: Position2DTarget + Send + 'static> SequenceBuilder<T> {
    #[must_use]
    pub fn move_2d_to(self, position: Vec2, duration: Duration) -> Self {
        self.animate::<Position2D>(Motion::To(position), duration)
    }

    #[must_use]
    pub fn move_2d_by(self, offset: Vec2, duration: Duration) -> Self {
        self.animate::<Position2D>(Motion::By(offset), duration)
    }
}

impl<T: RotationEulerTarget + Send + 'static> SequenceBuilder<T> {
    #[must_use]
    pub fn rotate_euler_to(self, angles: Vec3, duration: Duration) -> Self {
        self.animate::<RotationEuler>(Motion::To(angles), duration)
    }

    #[must_use]
    pub fn rotate_euler_by(self, angles: Vec3, duration: Duration) -> Self {
        self.animate::<RotationEuler>(Motion::By(angles), duration)
    }
}

impl<T: RotationQuaternionTarget + Send + 'static> SequenceBuilder<T> {
    #[must_use]
    pub fn rotate_quaternion_to(self, rotation: Quat, duration: Duration) -> Self {
        self.animate::<RotationQuaternion>(Motion::To(rotation), duration)
    }

    #[must_use]
    pub fn rotate_quaternion_by(self, rotation: Quat, duration: Duration) -> Self {
        self.animate::<RotationQuaternion>(Motion::By(rotation), duration)
    }
}

impl<T: ScalingTarget + Send + 'static> SequenceBuilder<T> {
    #[must_use]
    pub fn scale_to(self, scaling: Vec3, duration: Duration) -> Self {
        self.animate::<Scaling>(Motion::To(scaling), duration)
    }

    #[must_use]
    pub fn scale_by(self, factor_offset: Vec3, duration: Duration) -> Self {
        self.animate::<Scaling>(Motion::By(factor_offset), duration)
    }
}
