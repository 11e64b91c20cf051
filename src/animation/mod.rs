//! Animation System
//!
//! Time-injected animations over capability targets:
//!
//! - [`AnimationEngine`]: owns the active set and advances it deterministically
//! - [`PropertyAnimation`]: interpolates one property of a [`SharedTarget`]
//! - [`SequenceBuilder`]: composes steps into sequences and parallel groups
//! - [`EventDrivenPassInfo`]: per-pass diagnostics

pub mod builtin;
pub mod diagnostics;
pub mod easing;
pub mod engine;
pub mod property;
pub mod sequence;
pub mod target;
mod values;

pub use builtin::{
    CallbackAnimation, CompletionSignal, SignalAnimation, WaitAnimation, WaitUntilAnimation,
};
pub use diagnostics::{EventDrivenPassInfo, EventDrivenStepInfo};
pub use easing::Easing;
pub use engine::{
    AdvanceOutcome, Animation, AnimationDuration, AnimationEngine, AnimationHandle, AnimationState,
};
pub use property::{
    Motion, Position, Position2D, Property, PropertyAnimation, RotationEuler, RotationQuaternion,
    Scaling,
};
pub use sequence::{AnimationGroup, AnimationSequence, SequenceBuilder};
pub use target::{
    Position2DTarget, PositionTarget, RotationEulerTarget, RotationMode, RotationQuaternionTarget,
    ScalingTarget, SharedTarget, TargetId, Transform2D, Transform3D,
};
pub use values::Interpolatable;
