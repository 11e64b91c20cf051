//! Device Identity & Context
//!
//! A [`DeviceHandle`] is the opaque identity of one physical or logical GPU
//! device, as handed to the engine by the host's device enumeration. The
//! engine never enumerates hardware itself; it only consumes the identity and
//! the capability flags.
//!
//! A [`DeviceContext`] binds a handle to the [`ResourceRegistry`] that tracks
//! every resource realized on that device, plus its lost/active status.
//! Contexts are shared (`Arc`) between the device manager, the frame
//! schedulers rendering to that device and the resources realized on it.

mod manager;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::resources::ResourceRegistry;

pub use manager::{DeviceEnumerator, DeviceManager};

static NEXT_DEVICE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique device identity.
///
/// Ids are never reused, so a re-created device after a device-removed event
/// always compares unequal to the lost one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceId(u64);

impl DeviceId {
    /// Wraps a raw id. Intended for tests and diagnostics; live devices get
    /// their id from [`DeviceHandle::new`].
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    fn next() -> Self {
        Self(NEXT_DEVICE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

bitflags! {
    /// Capability flags reported by device enumeration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct DeviceFlags: u32 {
        /// Software rasterizer (WARP, llvmpipe, SwiftShader...).
        const SOFTWARE = 1 << 0;
        /// Validation / debug layers are enabled on this device.
        const DEBUG = 1 << 1;
    }
}

/// Opaque, cheaply clonable identity of one GPU device.
#[derive(Debug, Clone)]
pub struct DeviceHandle {
    id: DeviceId,
    flags: DeviceFlags,
    label: Arc<str>,
}

impl DeviceHandle {
    /// Creates a handle with a fresh process-unique id.
    #[must_use]
    pub fn new(label: impl Into<Arc<str>>, flags: DeviceFlags) -> Self {
        Self {
            id: DeviceId::next(),
            flags,
            label: label.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> DeviceId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn flags(&self) -> DeviceFlags {
        self.flags
    }

    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    #[must_use]
    pub fn is_software(&self) -> bool {
        self.flags.contains(DeviceFlags::SOFTWARE)
    }

    #[inline]
    #[must_use]
    pub fn debug_enabled(&self) -> bool {
        self.flags.contains(DeviceFlags::DEBUG)
    }
}

impl PartialEq for DeviceHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for DeviceHandle {}

impl std::hash::Hash for DeviceHandle {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.id)
    }
}

/// Whether a device can still hold realizations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceStatus {
    Active,
    /// Sticky: a lost device never becomes active again. The host creates a
    /// new [`DeviceHandle`] instead.
    Lost,
}

/// A device handle together with its resource registry.
pub struct DeviceContext {
    handle: DeviceHandle,
    registry: ResourceRegistry,
    lost: AtomicBool,
}

impl DeviceContext {
    #[must_use]
    pub fn new(handle: DeviceHandle) -> Arc<Self> {
        Arc::new(Self {
            registry: ResourceRegistry::new(handle.clone()),
            handle,
            lost: AtomicBool::new(false),
        })
    }

    #[inline]
    #[must_use]
    pub fn handle(&self) -> &DeviceHandle {
        &self.handle
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> DeviceId {
        self.handle.id
    }

    #[inline]
    #[must_use]
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    #[must_use]
    pub fn status(&self) -> DeviceStatus {
        if self.is_lost() {
            DeviceStatus::Lost
        } else {
            DeviceStatus::Active
        }
    }

    #[inline]
    #[must_use]
    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::Acquire)
    }

    /// Flags the device as lost. Returns `true` on the first call only.
    pub fn mark_lost(&self, reason: &str) -> bool {
        let first = !self.lost.swap(true, Ordering::AcqRel);
        if first {
            log::error!("Device {} lost: {}", self.handle, reason);
        }
        first
    }

    /// Unloads every resource realized on this device.
    ///
    /// Returns the number of realizations released.
    pub fn unload_all(&self) -> usize {
        self.registry.unload_all()
    }
}

impl fmt::Debug for DeviceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceContext")
            .field("handle", &self.handle)
            .field("status", &self.status())
            .field("registered", &self.registry.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_get_unique_ids() {
        let a = DeviceHandle::new("GPU 0", DeviceFlags::empty());
        let b = DeviceHandle::new("GPU 0", DeviceFlags::empty());
        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn capability_flags() {
        let warp = DeviceHandle::new("WARP", DeviceFlags::SOFTWARE | DeviceFlags::DEBUG);
        assert!(warp.is_software());
        assert!(warp.debug_enabled());

        let hw = DeviceHandle::new("RTX", DeviceFlags::empty());
        assert!(!hw.is_software());
        assert!(!hw.debug_enabled());
    }

    #[test]
    fn mark_lost_is_sticky() {
        let ctx = DeviceContext::new(DeviceHandle::new("GPU", DeviceFlags::empty()));
        assert_eq!(ctx.status(), DeviceStatus::Active);
        assert!(ctx.mark_lost("removed"));
        assert!(!ctx.mark_lost("removed again"));
        assert_eq!(ctx.status(), DeviceStatus::Lost);
    }
}
