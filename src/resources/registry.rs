//! Per-device resource registry.
//!
//! Every resource realized on a device holds one slot in that device's
//! registry. The registry only keeps weak references, so it never extends a
//! resource's lifetime; it exists to answer "what is loaded here" and to drive
//! bulk unloading when the device goes away.

use std::sync::Weak;

use parking_lot::{Condvar, Mutex};
use rustc_hash::FxHashMap;

use crate::device::DeviceHandle;
use crate::resources::arena::{SlotArena, SlotIndex};
use crate::resources::resource::{DeviceResource, ResourceId};

struct RegistryEntry {
    id: ResourceId,
    resource: Weak<dyn DeviceResource>,
}

#[derive(Default)]
struct RegistryInner {
    slots: SlotArena<RegistryEntry>,
    lookup: FxHashMap<ResourceId, SlotIndex>,
}

/// Table of resources realized on one device.
pub struct ResourceRegistry {
    device: DeviceHandle,
    inner: Mutex<RegistryInner>,
    /// Signalled whenever an entry is removed.
    removed: Condvar,
}

impl ResourceRegistry {
    #[must_use]
    pub fn new(device: DeviceHandle) -> Self {
        Self {
            device,
            inner: Mutex::new(RegistryInner::default()),
            removed: Condvar::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn device(&self) -> &DeviceHandle {
        &self.device
    }

    /// Assigns a slot to `id`. A resource registered twice keeps its first slot.
    pub fn register(&self, id: ResourceId, resource: Weak<dyn DeviceResource>) -> SlotIndex {
        let mut inner = self.inner.lock();
        if let Some(&slot) = inner.lookup.get(&id) {
            log::warn!(
                "Resource {id} registered twice on device {}; keeping slot {slot}",
                self.device
            );
            return slot;
        }
        let slot = inner.slots.insert(RegistryEntry { id, resource });
        inner.lookup.insert(id, slot);
        slot
    }

    /// Frees `slot` if it still belongs to `id`.
    pub fn remove(&self, slot: SlotIndex, id: ResourceId) -> bool {
        let mut inner = self.inner.lock();
        match inner.slots.get(slot) {
            Some(entry) if entry.id == id => {
                inner.slots.remove(slot);
                inner.lookup.remove(&id);
                self.removed.notify_all();
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn slot_of(&self, id: ResourceId) -> Option<SlotIndex> {
        self.inner.lock().lookup.get(&id).copied()
    }

    #[must_use]
    pub fn contains(&self, id: ResourceId) -> bool {
        self.inner.lock().lookup.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slots allocated so far, including free ones.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.lock().slots.capacity()
    }

    /// Registered resource ids in slot order.
    #[must_use]
    pub fn resource_ids(&self) -> Vec<ResourceId> {
        self.inner.lock().slots.iter().map(|(_, e)| e.id).collect()
    }

    /// Unloads every registered resource from this device.
    ///
    /// The registry lock is released before any resource is touched, because
    /// unloading calls back into [`remove`](Self::remove). Entries whose owner
    /// is being dropped on another thread are waited for, so every realization
    /// on the device has been released when this returns. Calling it while
    /// holding a realization guard of such a resource deadlocks.
    pub fn unload_all(&self) -> usize {
        let entries: Vec<(SlotIndex, ResourceId, Weak<dyn DeviceResource>)> = {
            let inner = self.inner.lock();
            inner
                .slots
                .iter()
                .map(|(slot, e)| (slot, e.id, e.resource.clone()))
                .collect()
        };

        let mut released = 0;
        let mut dropping = Vec::new();
        for (slot, id, weak) in entries {
            match weak.upgrade() {
                Some(resource) => {
                    if resource.unload(&self.device) {
                        released += 1;
                    }
                }
                // The owner's `Drop` releases it and removes the entry.
                None => dropping.push((slot, id)),
            }
        }

        if !dropping.is_empty() {
            let mut inner = self.inner.lock();
            while dropping
                .iter()
                .any(|(slot, id)| inner.slots.get(*slot).is_some_and(|e| e.id == *id))
            {
                self.removed.wait(&mut inner);
            }
            released += dropping.len();
        }

        log::debug!("Unloaded {released} resources from device {}", self.device);
        released
    }
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("device", &self.device.id())
            .field("len", &self.len())
            .finish()
    }
}
