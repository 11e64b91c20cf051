use glam::{Quat, Vec2, Vec3};

/// Values a property animation can drive.
pub trait Interpolatable: Copy + Send + Sync + 'static {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self;

    /// Applies a relative change, used to resolve "by" animations.
    fn offset(base: Self, delta: Self) -> Self;
}

impl Interpolatable for f32 {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start + (end - start) * t
    }

    fn offset(base: Self, delta: Self) -> Self {
        base + delta
    }
}

impl Interpolatable for Vec2 {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start.lerp(end, t)
    }

    fn offset(base: Self, delta: Self) -> Self {
        base + delta
    }
}

impl Interpolatable for Vec3 {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start.lerp(end, t)
    }

    fn offset(base: Self, delta: Self) -> Self {
        base + delta
    }
}

impl Interpolatable for Quat {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start.slerp(end, t)
    }

    /// `delta` is applied after `base` (world-space composition).
    fn offset(base: Self, delta: Self) -> Self {
        (delta * base).normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn f32_linear_midpoint() {
        assert!((f32::interpolate_linear(0.0, 10.0, 0.5) - 5.0).abs() < EPSILON);
    }

    #[test]
    fn vec3_linear_endpoints() {
        let a = Vec3::ZERO;
        let b = Vec3::new(2.0, 4.0, 6.0);
        assert_eq!(Vec3::interpolate_linear(a, b, 0.0), a);
        assert_eq!(Vec3::interpolate_linear(a, b, 1.0), b);
    }

    #[test]
    fn vec2_offset_adds() {
        assert_eq!(Vec2::offset(Vec2::new(1.0, 1.0), Vec2::new(2.0, -1.0)), Vec2::new(3.0, 0.0));
    }

    #[test]
    fn quat_offset_composes() {
        let base = Quat::from_rotation_y(FRAC_PI_2);
        let delta = Quat::from_rotation_y(FRAC_PI_2);
        let combined = Quat::offset(base, delta);
        let expected = Quat::from_rotation_y(std::f32::consts::PI);
        assert!(combined.angle_between(expected) < 1e-4);
    }
}
