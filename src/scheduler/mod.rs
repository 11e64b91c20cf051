//! Frame Scheduler
//!
//! Drives one render target (device + view) through
//! `Idle → AnimationStep → ResourceEnsure → Render → Present → Idle`.
//!
//! Failures are routed by [`ErrorSeverity`]:
//!
//! - transient: the resource is skipped for this frame and reported as a
//!   [`FrameWarning`]; it is retried next frame
//! - fatal: the device is marked lost, everything realized on it is unloaded
//!   and the scheduler parks in [`FrameStage::DeviceLost`] until
//!   [`FrameScheduler::reinitialize`]
//! - programming: returned to the caller as-is

pub mod settings;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rustc_hash::FxHashSet;

use crate::animation::{AnimationEngine, EventDrivenPassInfo};
use crate::device::DeviceContext;
use crate::errors::{ErrorSeverity, LumenError, Result};
use crate::resources::{DeviceResource, RealizationGuard, Resource, ResourceFactory, ResourceId};

pub use settings::{AnimationSettings, SchedulerSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrameStage {
    #[default]
    Idle,
    AnimationStep,
    ResourceEnsure,
    Render,
    Present,
    /// Terminal until the scheduler is re-initialized on a fresh device.
    DeviceLost,
}

/// Host windowing collaborator.
pub trait RenderHost {
    /// Time elapsed since the previous frame.
    fn frame_delta(&mut self) -> Duration;

    /// Called after a successful render.
    fn present(&mut self, report: &FrameReport) -> Result<()>;
}

/// Records the frame's draw work against realized resources.
pub trait FrameRenderer {
    fn render(&mut self, ctx: &RenderContext<'_>) -> Result<()>;
}

/// What a renderer sees during [`FrameStage::Render`].
pub struct RenderContext<'a> {
    device: &'a Arc<DeviceContext>,
    frame_index: u64,
    unavailable: &'a FxHashSet<ResourceId>,
}

impl RenderContext<'_> {
    #[inline]
    #[must_use]
    pub fn device(&self) -> &Arc<DeviceContext> {
        self.device
    }

    #[inline]
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// `false` for resources whose realization failed this frame.
    #[must_use]
    pub fn is_available(&self, id: ResourceId) -> bool {
        !self.unavailable.contains(&id)
    }

    /// Read access to `resource` on this frame's device.
    pub fn realization<F: ResourceFactory>(
        &self,
        resource: &Resource<F>,
    ) -> Result<RealizationGuard<F::Realization>> {
        resource.realization(self.device.handle())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameWarning {
    /// Realization failed transiently; the resource was skipped this frame.
    ResourceUnavailable {
        resource: ResourceId,
        label: String,
        error: LumenError,
    },
    /// The renderer reported a transient failure; the frame was not presented.
    RenderFailed(LumenError),
    /// The host could not present; the frame was rendered but not shown.
    PresentFailed(LumenError),
}

impl fmt::Display for FrameWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceUnavailable {
                resource,
                label,
                error,
            } => write!(f, "{label} ({resource}) skipped: {error}"),
            Self::RenderFailed(error) => write!(f, "render failed: {error}"),
            Self::PresentFailed(error) => write!(f, "present failed: {error}"),
        }
    }
}

/// Outcome of one [`FrameScheduler::run_frame`].
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame_index: u64,
    /// Last stage the frame entered
    pub stage_reached: FrameStage,
    pub step: EventDrivenPassInfo,
    pub warnings: Vec<FrameWarning>,
    pub skipped: Vec<ResourceId>,
    pub presented: bool,
}

impl FrameReport {
    #[inline]
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Per-view frame driver.
pub struct FrameScheduler {
    device: Arc<DeviceContext>,
    animations: AnimationEngine,
    working_set: Vec<Arc<dyn DeviceResource>>,
    settings: SchedulerSettings,
    stage: FrameStage,
    frame_index: u64,
}

impl FrameScheduler {
    #[must_use]
    pub fn new(device: Arc<DeviceContext>) -> Self {
        Self::with_settings(device, SchedulerSettings::default())
    }

    #[must_use]
    pub fn with_settings(device: Arc<DeviceContext>, settings: SchedulerSettings) -> Self {
        Self {
            device,
            animations: AnimationEngine::with_settings(settings.animation.clone()),
            working_set: Vec::new(),
            settings,
            stage: FrameStage::Idle,
            frame_index: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn device(&self) -> &Arc<DeviceContext> {
        &self.device
    }

    #[inline]
    #[must_use]
    pub fn stage(&self) -> FrameStage {
        self.stage
    }

    #[inline]
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Current settings. `animation` mirrors the engine, including changes
    /// made through [`animations_mut`](Self::animations_mut).
    #[must_use]
    pub fn settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            animation: self.animations.settings().clone(),
            ..self.settings.clone()
        }
    }

    #[inline]
    #[must_use]
    pub fn animations(&self) -> &AnimationEngine {
        &self.animations
    }

    #[inline]
    pub fn animations_mut(&mut self) -> &mut AnimationEngine {
        &mut self.animations
    }

    #[inline]
    #[must_use]
    pub fn working_set_len(&self) -> usize {
        self.working_set.len()
    }

    /// Adds a resource to the set ensured every frame. Returns `false` if it
    /// was already registered.
    pub fn register_resource(&mut self, resource: Arc<dyn DeviceResource>) -> bool {
        let id = resource.resource_id();
        if self.working_set.iter().any(|r| r.resource_id() == id) {
            return false;
        }
        self.working_set.push(resource);
        true
    }

    /// Removes a resource from the working set without unloading it; other
    /// views may still be using its realization.
    pub fn unregister_resource(&mut self, id: ResourceId) -> Option<Arc<dyn DeviceResource>> {
        let index = self.working_set.iter().position(|r| r.resource_id() == id)?;
        Some(self.working_set.remove(index))
    }

    /// Runs one frame.
    ///
    /// Returns an error for fatal (device loss) and programming failures;
    /// transient failures are reported in the [`FrameReport`].
    pub fn run_frame(
        &mut self,
        host: &mut dyn RenderHost,
        renderer: &mut dyn FrameRenderer,
    ) -> Result<FrameReport> {
        if self.stage == FrameStage::DeviceLost {
            return Err(LumenError::device_lost(
                self.device.id(),
                "scheduler is waiting for re-initialization",
            ));
        }
        if self.device.is_lost() {
            let err = LumenError::device_lost(self.device.id(), "device was lost between frames");
            self.enter_device_lost(&err);
            return Err(err);
        }

        self.frame_index += 1;

        // Animation
        self.stage = FrameStage::AnimationStep;
        let mut delta = host.frame_delta();
        if let Some(max) = self.settings.max_frame_delta {
            delta = delta.min(max);
        }
        let step = if self.settings.event_driven {
            self.animations.advance_event_driven(delta)
        } else {
            self.animations.advance_by_time(delta).into()
        };

        // Resources
        self.stage = FrameStage::ResourceEnsure;
        self.working_set.retain(|r| !r.is_disposed());

        let mut warnings = Vec::new();
        let mut skipped = Vec::new();
        let mut unavailable = FxHashSet::default();

        let mut failure = None;
        for resource in &self.working_set {
            let Err(err) = resource.ensure_loaded(&self.device) else {
                continue;
            };
            if !err.is_transient() {
                failure = Some(err);
                break;
            }
            log::warn!(
                "Frame {}: {} ({}) unavailable: {err}",
                self.frame_index,
                resource.label(),
                resource.resource_id()
            );
            let id = resource.resource_id();
            skipped.push(id);
            unavailable.insert(id);
            warnings.push(FrameWarning::ResourceUnavailable {
                resource: id,
                label: resource.label().to_string(),
                error: err,
            });
        }
        if let Some(err) = failure {
            return Err(self.abort_frame(err));
        }

        // Render
        self.stage = FrameStage::Render;
        let ctx = RenderContext {
            device: &self.device,
            frame_index: self.frame_index,
            unavailable: &unavailable,
        };
        let mut render_ok = true;
        if let Err(err) = renderer.render(&ctx) {
            if !err.is_transient() {
                return Err(self.abort_frame(err));
            }
            log::warn!("Frame {}: {err}", self.frame_index);
            warnings.push(FrameWarning::RenderFailed(err));
            render_ok = false;
        }

        let present = render_ok && (warnings.is_empty() || self.settings.present_with_warnings);
        let mut report = FrameReport {
            frame_index: self.frame_index,
            stage_reached: FrameStage::Render,
            step,
            warnings,
            skipped,
            presented: present,
        };

        // Present
        if present {
            self.stage = FrameStage::Present;
            report.stage_reached = FrameStage::Present;
            if let Err(err) = host.present(&report) {
                if !err.is_transient() {
                    return Err(self.abort_frame(err));
                }
                log::warn!("Frame {}: {err}", self.frame_index);
                report.warnings.push(FrameWarning::PresentFailed(err));
                report.presented = false;
            }
        }

        self.stage = FrameStage::Idle;
        Ok(report)
    }

    /// Leaves the frame after a non-transient failure.
    fn abort_frame(&mut self, err: LumenError) -> LumenError {
        match err.severity() {
            ErrorSeverity::Fatal => self.enter_device_lost(&err),
            ErrorSeverity::Transient | ErrorSeverity::Programming => self.stage = FrameStage::Idle,
        }
        err
    }

    fn enter_device_lost(&mut self, err: &LumenError) {
        self.device.mark_lost(&err.to_string());
        let released = self.device.unload_all();
        self.stage = FrameStage::DeviceLost;
        log::info!(
            "Scheduler on {} entered DeviceLost after frame {}; released {released} realizations",
            self.device.handle(),
            self.frame_index
        );
    }

    /// Moves the scheduler onto `device`.
    ///
    /// Everything realized on the previous device is unloaded; the working
    /// set is realized again on the new device during the next frame.
    pub fn reinitialize(&mut self, device: Arc<DeviceContext>) -> Result<()> {
        if device.is_lost() {
            return Err(LumenError::InvalidArgument(format!(
                "cannot re-initialize onto lost device {}",
                device.handle()
            )));
        }

        let previous = std::mem::replace(&mut self.device, device);
        let released = previous.unload_all();
        for resource in &self.working_set {
            resource.unload(previous.handle());
        }
        self.stage = FrameStage::Idle;

        log::info!(
            "Scheduler re-initialized from {} to {}; released {released} realizations",
            previous.handle(),
            self.device.handle()
        );
        Ok(())
    }
}

impl fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("device", self.device.handle())
            .field("stage", &self.stage)
            .field("frame_index", &self.frame_index)
            .field("working_set", &self.working_set.len())
            .field("animations", &self.animations)
            .finish()
    }
}
