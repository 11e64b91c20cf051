//! Property animations over capability targets.
//!
//! A property marker (e.g. [`Position`]) names one animatable capability and
//! is implemented for every target carrying that capability trait. The
//! generic [`PropertyAnimation`] then works for any (property, target) pair.

use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;

use glam::{Quat, Vec2, Vec3};

use crate::animation::builtin::Timeline;
use crate::animation::easing::Easing;
use crate::animation::engine::{AdvanceOutcome, Animation, AnimationDuration, AnimationState};
use crate::animation::target::{
    Position2DTarget, PositionTarget, RotationEulerTarget, RotationQuaternionTarget, ScalingTarget,
    SharedTarget, TargetId,
};
use crate::animation::values::Interpolatable;

/// One animatable property of targets of type `T`.
pub trait Property<T>: Send + Sync + 'static {
    type Value: Interpolatable;

    const NAME: &'static str;

    fn get(target: &T) -> Self::Value;

    fn set(target: &mut T, value: Self::Value);
}

pub struct Position;
pub struct Position2D;
pub struct RotationEuler;
pub struct RotationQuaternion;
pub struct Scaling;

impl<T: PositionTarget> Property<T> for Position {
    type Value = Vec3;
    const NAME: &'static str = "Position";

    fn get(target: &T) -> Vec3 {
        target.position()
    }

    fn set(target: &mut T, value: Vec3) {
        target.set_position(value);
    }
}

impl<T: Position2DTarget> Property<T> for Position2D {
    type Value = Vec2;
    const NAME: &'static str = "Position2D";

    fn get(target: &T) -> Vec2 {
        target.position_2d()
    }

    fn set(target: &mut T, value: Vec2) {
        target.set_position_2d(value);
    }
}

impl<T: RotationEulerTarget> Property<T> for RotationEuler {
    type Value = Vec3;
    const NAME: &'static str = "RotationEuler";

    fn get(target: &T) -> Vec3 {
        target.rotation_euler()
    }

    fn set(target: &mut T, value: Vec3) {
        target.set_rotation_euler(value);
    }
}

impl<T: RotationQuaternionTarget> Property<T> for RotationQuaternion {
    type Value = Quat;
    const NAME: &'static str = "RotationQuaternion";

    fn get(target: &T) -> Quat {
        target.rotation_quaternion()
    }

    fn set(target: &mut T, value: Quat) {
        target.set_rotation_quaternion(value);
    }
}

impl<T: ScalingTarget> Property<T> for Scaling {
    type Value = Vec3;
    const NAME: &'static str = "Scaling";

    fn get(target: &T) -> Vec3 {
        target.scaling()
    }

    fn set(target: &mut T, value: Vec3) {
        target.set_scaling(value);
    }
}

/// Absolute or relative end point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion<V> {
    To(V),
    By(V),
}

/// Interpolates property `P` of a shared target from its value on the first
/// tick to the motion's end point.
pub struct PropertyAnimation<P, T>
where
    P: Property<T>,
{
    target: SharedTarget<T>,
    motion: Motion<P::Value>,
    easing: Easing,
    timeline: Timeline,
    /// Start and end, resolved on the first tick.
    endpoints: Option<(P::Value, P::Value)>,
    _property: PhantomData<fn() -> P>,
}

impl<P, T> PropertyAnimation<P, T>
where
    P: Property<T>,
{
    #[must_use]
    pub fn new(target: SharedTarget<T>, motion: Motion<P::Value>, duration: Duration) -> Self {
        Self {
            target,
            motion,
            easing: Easing::Linear,
            timeline: Timeline::new(duration),
            endpoints: None,
            _property: PhantomData,
        }
    }

    /// Animates to an absolute value.
    #[must_use]
    pub fn to(target: SharedTarget<T>, value: P::Value, duration: Duration) -> Self {
        Self::new(target, Motion::To(value), duration)
    }

    /// Animates by an offset from the value found on the first tick.
    #[must_use]
    pub fn by(target: SharedTarget<T>, delta: P::Value, duration: Duration) -> Self {
        Self::new(target, Motion::By(delta), duration)
    }

    #[must_use]
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    #[inline]
    #[must_use]
    pub fn easing(&self) -> Easing {
        self.easing
    }

    #[inline]
    #[must_use]
    pub fn motion(&self) -> &Motion<P::Value> {
        &self.motion
    }
}

impl<P, T> Animation for PropertyAnimation<P, T>
where
    P: Property<T>,
    T: Send + 'static,
{
    fn target(&self) -> Option<TargetId> {
        Some(self.target.id())
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
        if self.timeline.state == AnimationState::Finished {
            return AdvanceOutcome::finished(delta);
        }

        let mut target = self.target.lock();
        let (start, end) = *self.endpoints.get_or_insert_with(|| {
            let start = P::get(&target);
            let end = match self.motion {
                Motion::To(value) => value,
                Motion::By(offset) => Interpolatable::offset(start, offset),
            };
            (start, end)
        });

        let outcome = self.timeline.advance(delta);
        let value = if outcome.is_finished() {
            end
        } else {
            let t = self.easing.evaluate(self.timeline.fraction());
            Interpolatable::interpolate_linear(start, end, t)
        };
        P::set(&mut target, value);
        outcome
    }

    fn label(&self) -> &str {
        P::NAME
    }
}

impl<P, T> fmt::Debug for PropertyAnimation<P, T>
where
    P: Property<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyAnimation")
            .field("property", &P::NAME)
            .field("target", &self.target.id())
            .field("easing", &self.easing)
            .field("timeline", &self.timeline)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::target::{Transform2D, Transform3D};

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn move_to_interpolates_linearly() {
        let target = SharedTarget::new(Transform3D::new());
        let mut anim = PropertyAnimation::<Position, _>::to(
            target.clone(),
            Vec3::new(10.0, 0.0, 0.0),
            ms(100),
        );

        anim.advance(ms(25));
        assert!((target.lock().position.x - 2.5).abs() < 1e-5);
        assert!(anim.advance(ms(75)).is_finished());
        assert_eq!(target.lock().position, Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn by_captures_start_on_first_tick() {
        let target = SharedTarget::new(Transform3D::new());
        let mut anim =
            PropertyAnimation::<Scaling, _>::by(target.clone(), Vec3::splat(1.0), ms(10));

        // Changed after construction but before the first tick.
        target.lock().scaling = Vec3::splat(3.0);
        anim.advance(ms(10));
        assert_eq!(target.lock().scaling, Vec3::splat(4.0));
    }

    #[test]
    fn zero_duration_applies_end_immediately() {
        let target = SharedTarget::new(Transform2D::default());
        let mut anim = PropertyAnimation::<Position2D, _>::to(
            target.clone(),
            Vec2::new(4.0, 2.0),
            Duration::ZERO,
        );
        assert!(anim.advance(Duration::ZERO).is_finished());
        assert_eq!(target.lock().position, Vec2::new(4.0, 2.0));
    }

    #[test]
    fn easing_shapes_intermediate_values() {
        let target = SharedTarget::new(Transform3D::new());
        let mut anim = PropertyAnimation::<Position, _>::to(target.clone(), Vec3::X, ms(100))
            .with_easing(Easing::QuadIn);
        anim.advance(ms(50));
        assert!((target.lock().position.x - 0.25).abs() < 1e-5);
    }

    #[test]
    fn quaternion_rotation_switches_mode() {
        let target = SharedTarget::new(Transform3D::new());
        let end = Quat::from_rotation_y(1.0);
        let mut anim = PropertyAnimation::<RotationQuaternion, _>::to(target.clone(), end, ms(20));
        anim.advance(ms(20));
        let t = target.snapshot();
        assert_eq!(t.rotation_quaternion, end);
        assert_eq!(t.rotation_mode, crate::animation::target::RotationMode::Quaternion);
        assert_eq!(anim.label(), "RotationQuaternion");
    }
}
