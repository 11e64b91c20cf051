//! Animation targets.
//!
//! Targets are shared with the animation engine through [`SharedTarget`],
//! and advertise what can be animated by implementing one or more capability
//! traits. Adding a new animatable property means adding a new capability
//! trait and a property marker; existing targets are unaffected.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Affine3A, EulerRot, Quat, Vec2, Vec3};
use parking_lot::{Mutex, MutexGuard};

static NEXT_TARGET_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of an animated object, used for per-target ordering and cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(u64);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Shared, identity-carrying handle to an animated object.
pub struct SharedTarget<T> {
    inner: Arc<Mutex<T>>,
    id: TargetId,
}

impl<T> SharedTarget<T> {
    /// Wraps a value and assigns it a new id.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(value)),
            id: TargetId(NEXT_TARGET_ID.fetch_add(1, Ordering::Relaxed)),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> TargetId {
        self.id
    }

    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock()
    }

    /// Reads through the lock.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.lock())
    }
}

impl<T: Clone> SharedTarget<T> {
    #[must_use]
    pub fn snapshot(&self) -> T {
        self.inner.lock().clone()
    }
}

impl<T> Clone for SharedTarget<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            id: self.id,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for SharedTarget<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedTarget")
            .field("id", &self.id)
            .field("value", &*self.inner.lock())
            .finish()
    }
}

// ============================================================================
// Capability traits
// ============================================================================

pub trait PositionTarget {
    fn position(&self) -> Vec3;
    fn set_position(&mut self, value: Vec3);
}

pub trait Position2DTarget {
    fn position_2d(&self) -> Vec2;
    fn set_position_2d(&mut self, value: Vec2);
}

/// Euler angles in radians: `x` = pitch, `y` = yaw, `z` = roll.
pub trait RotationEulerTarget {
    fn rotation_euler(&self) -> Vec3;
    fn set_rotation_euler(&mut self, value: Vec3);
}

pub trait RotationQuaternionTarget {
    fn rotation_quaternion(&self) -> Quat;
    fn set_rotation_quaternion(&mut self, value: Quat);
}

pub trait ScalingTarget {
    fn scaling(&self) -> Vec3;
    fn set_scaling(&mut self, value: Vec3);
}

// ============================================================================
// Stock targets
// ============================================================================

/// Which rotation representation a [`Transform3D`] uses when building its matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RotationMode {
    #[default]
    EulerAngles,
    Quaternion,
}

/// Position / rotation / scale of a 3D object.
///
/// Euler angles and the quaternion are stored separately so that animating
/// one never round-trips through the other. Setting either one switches
/// [`RotationMode`].
#[derive(Debug, Clone, PartialEq)]
pub struct Transform3D {
    pub position: Vec3,
    pub rotation_euler: Vec3,
    pub rotation_quaternion: Quat,
    pub rotation_mode: RotationMode,
    pub scaling: Vec3,
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform3D {
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation_euler: Vec3::ZERO,
            rotation_quaternion: Quat::IDENTITY,
            rotation_mode: RotationMode::EulerAngles,
            scaling: Vec3::ONE,
        }
    }

    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::new()
        }
    }

    /// Effective rotation for the current [`RotationMode`].
    #[must_use]
    pub fn rotation(&self) -> Quat {
        match self.rotation_mode {
            RotationMode::EulerAngles => Quat::from_euler(
                EulerRot::YXZ,
                self.rotation_euler.y,
                self.rotation_euler.x,
                self.rotation_euler.z,
            ),
            RotationMode::Quaternion => self.rotation_quaternion,
        }
    }

    #[must_use]
    pub fn local_matrix(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scaling, self.rotation(), self.position)
    }
}

impl PositionTarget for Transform3D {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, value: Vec3) {
        self.position = value;
    }
}

impl RotationEulerTarget for Transform3D {
    fn rotation_euler(&self) -> Vec3 {
        self.rotation_euler
    }

    fn set_rotation_euler(&mut self, value: Vec3) {
        self.rotation_euler = value;
        self.rotation_mode = RotationMode::EulerAngles;
    }
}

impl RotationQuaternionTarget for Transform3D {
    fn rotation_quaternion(&self) -> Quat {
        self.rotation_quaternion
    }

    fn set_rotation_quaternion(&mut self, value: Quat) {
        self.rotation_quaternion = value;
        self.rotation_mode = RotationMode::Quaternion;
    }
}

impl ScalingTarget for Transform3D {
    fn scaling(&self) -> Vec3 {
        self.scaling
    }

    fn set_scaling(&mut self, value: Vec3) {
        self.scaling = value;
    }
}

/// Screen-space placement of a 2D element.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform2D {
    pub position: Vec2,
}

impl Position2DTarget for Transform2D {
    fn position_2d(&self) -> Vec2 {
        self.position
    }

    fn set_position_2d(&mut self, value: Vec2) {
        self.position = value;
    }
}
