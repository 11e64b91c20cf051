use std::sync::Arc;

use crate::device::{DeviceContext, DeviceHandle, DeviceId};
use crate::errors::{LumenError, Result};

/// Host-side device enumeration.
///
/// Implemented by whatever owns the real graphics API (adapter lists, DXGI
/// factories, Vulkan physical devices...).
pub trait DeviceEnumerator {
    fn enumerate(&self) -> Vec<DeviceHandle>;
}

/// Engine root: owns one [`DeviceContext`] per enumerated device.
///
/// Devices keep their enumeration order. Removing a device unloads every
/// resource realized on it before the context is dropped.
#[derive(Default)]
pub struct DeviceManager {
    devices: Vec<Arc<DeviceContext>>,
}

impl DeviceManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_enumerator(enumerator: &dyn DeviceEnumerator) -> Self {
        let mut manager = Self::new();
        for handle in enumerator.enumerate() {
            manager.add_device(handle);
        }
        manager
    }

    /// Adds a device. Adding the same handle twice returns the existing context.
    pub fn add_device(&mut self, handle: DeviceHandle) -> Arc<DeviceContext> {
        if let Some(existing) = self.device(handle.id()) {
            return existing;
        }
        log::info!("Device added: {handle} [{:?}]", handle.flags());
        let context = DeviceContext::new(handle);
        self.devices.push(Arc::clone(&context));
        context
    }

    /// Handles a device-removed event.
    ///
    /// The device is marked lost, all of its realizations are unloaded, and it
    /// is dropped from the manager. Returns the number of realizations released.
    pub fn remove_device(&mut self, id: DeviceId) -> Result<usize> {
        let index = self
            .devices
            .iter()
            .position(|d| d.id() == id)
            .ok_or(LumenError::UnknownDevice(id))?;

        let context = self.devices.remove(index);
        context.mark_lost("device removed");
        let released = context.unload_all();
        log::info!(
            "Device removed: {} ({} realizations released)",
            context.handle(),
            released
        );
        Ok(released)
    }

    #[must_use]
    pub fn device(&self, id: DeviceId) -> Option<Arc<DeviceContext>> {
        self.devices.iter().find(|d| d.id() == id).cloned()
    }

    #[must_use]
    pub fn devices(&self) -> &[Arc<DeviceContext>] {
        &self.devices
    }

    /// First hardware device, falling back to the first device of any kind.
    #[must_use]
    pub fn default_device(&self) -> Option<Arc<DeviceContext>> {
        self.devices
            .iter()
            .find(|d| !d.handle().is_software())
            .or_else(|| self.devices.first())
            .cloned()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Removes every device in enumeration order.
    pub fn shutdown(&mut self) -> usize {
        let ids: Vec<DeviceId> = self.devices.iter().map(|d| d.id()).collect();
        ids.into_iter()
            .filter_map(|id| self.remove_device(id).ok())
            .sum()
    }
}

impl Drop for DeviceManager {
    fn drop(&mut self) {
        if !self.devices.is_empty() {
            self.shutdown();
        }
    }
}
