#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! Lumen engine core: per-device GPU resource lifecycle, deterministic
//! animation and the frame scheduler that ties them together.

pub mod animation;
pub mod device;
pub mod errors;
pub mod resources;
pub mod scheduler;
pub mod utils;

pub use animation::{
    Animation, AnimationEngine, AnimationHandle, AnimationState, Easing, EventDrivenPassInfo,
    EventDrivenStepInfo, SequenceBuilder, SharedTarget,
};
pub use device::{DeviceContext, DeviceFlags, DeviceHandle, DeviceId, DeviceManager};
pub use errors::{ErrorSeverity, LumenError, Result};
pub use resources::{DeviceResource, Resource, ResourceFactory, ResourceId, ResourceRegistry};
pub use scheduler::{
    AnimationSettings, FrameRenderer, FrameReport, FrameScheduler, FrameStage, RenderContext,
    RenderHost, SchedulerSettings,
};
pub use utils::FrameClock;
