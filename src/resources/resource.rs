//! Device-realized resources.
//!
//! A [`Resource`] couples a CPU-side description (its [`ResourceFactory`]) with
//! zero or more per-device realizations. Construction never touches a device;
//! realization happens only through [`Resource::ensure_loaded`], at the point
//! in the frame the scheduler chooses.
//!
//! # Locking
//!
//! Each (resource, device) pair owns a [`DeviceCell`] with its own load lock,
//! so two threads realizing *different* resources, or the same resource on
//! *different* devices, never contend. Readers hold a lease on the cell's
//! [`DrainBarrier`]; unloading waits for those leases before the realization
//! is handed back to the factory.

use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::device::{DeviceContext, DeviceHandle, DeviceId};
use crate::errors::{LumenError, Result};
use crate::resources::arena::SlotIndex;
use crate::resources::drain::{DrainBarrier, ReadLease};

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique resource identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

impl ResourceId {
    fn next() -> Self {
        Self(NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// CPU-side description that knows how to build a device realization.
///
/// `build` is the only place GPU calls are made for a resource. It must either
/// return a complete realization or an error; partial state is never stored.
pub trait ResourceFactory: Send + Sync + 'static {
    type Realization: Send + Sync + 'static;

    fn label(&self) -> &str {
        "Resource"
    }

    /// Builds the realization for `device`.
    ///
    /// Return [`LumenError::GraphicsResource`] for recoverable failures and
    /// [`LumenError::DeviceLost`] when the device itself is gone.
    fn build(&self, device: &DeviceHandle) -> Result<Self::Realization>;

    /// Releases a realization. Called once per successful `build`, after all
    /// readers have drained.
    fn release(&self, _device: &DeviceHandle, realization: Self::Realization) {
        drop(realization);
    }
}

/// Result of an ensure operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnsureResult {
    /// Registry slot of the resource on the device
    pub slot: SlotIndex,
    /// Whether the realization was built by this call
    pub was_created: bool,
}

impl EnsureResult {
    #[inline]
    #[must_use]
    pub fn existing(slot: SlotIndex) -> Self {
        Self {
            slot,
            was_created: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn created(slot: SlotIndex) -> Self {
        Self {
            slot,
            was_created: true,
        }
    }
}

/// Type-erased view of a [`Resource`], used by registries and schedulers.
pub trait DeviceResource: Send + Sync {
    fn resource_id(&self) -> ResourceId;

    fn label(&self) -> &str;

    /// Whether a realization currently exists on `device`.
    fn is_loaded(&self, device: &DeviceHandle) -> bool;

    /// Registry slot on `device`, or `None` when not realized there.
    fn device_resource_index(&self, device: &DeviceHandle) -> Option<SlotIndex>;

    fn ensure_loaded(&self, device: &Arc<DeviceContext>) -> Result<EnsureResult>;

    /// Releases the realization on `device`. Returns `false` if there was none.
    fn unload(&self, device: &DeviceHandle) -> bool;

    /// Releases every realization on every device.
    fn unload_all(&self) -> usize;

    fn is_disposed(&self) -> bool;
}

struct Realized<R> {
    slot: SlotIndex,
    value: Arc<R>,
}

/// State of one (resource, device) pair.
struct DeviceCell<R> {
    context: Arc<DeviceContext>,
    /// Serializes ensure and unload for this pair only.
    load_lock: Mutex<()>,
    state: RwLock<Option<Realized<R>>>,
    barrier: Arc<DrainBarrier>,
}

impl<R: Send + Sync + 'static> DeviceCell<R> {
    fn new(context: Arc<DeviceContext>) -> Self {
        Self {
            context,
            load_lock: Mutex::new(()),
            state: RwLock::new(None),
            barrier: DrainBarrier::new(),
        }
    }

    fn slot(&self) -> Option<SlotIndex> {
        self.state.read().as_ref().map(|r| r.slot)
    }

    fn release<F>(&self, id: ResourceId, factory: &F) -> bool
    where
        F: ResourceFactory<Realization = R>,
    {
        let _load = self.load_lock.lock();
        let Some(realized) = self.state.write().take() else {
            return false;
        };

        // New readers are refused from here on; wait for the ones in flight.
        self.barrier.wait_drained();

        match Arc::try_unwrap(realized.value) {
            Ok(value) => factory.release(self.context.handle(), value),
            Err(_) => log::warn!(
                "Realization of {id} on {} still shared after drain; dropped without release hook",
                self.context.handle()
            ),
        }
        // Freed last: an empty slot means the release hook has finished.
        self.context.registry().remove(realized.slot, id);
        true
    }
}

/// Read access to a realization, held for the duration of a render pass.
///
/// While any guard is alive, unloading the same (resource, device) pair blocks.
pub struct RealizationGuard<R> {
    // Dropped before the lease.
    value: Arc<R>,
    device: DeviceId,
    slot: SlotIndex,
    _lease: ReadLease,
}

impl<R> RealizationGuard<R> {
    #[inline]
    #[must_use]
    pub fn device(&self) -> DeviceId {
        self.device
    }

    #[inline]
    #[must_use]
    pub fn slot(&self) -> SlotIndex {
        self.slot
    }
}

impl<R: fmt::Debug> fmt::Debug for RealizationGuard<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealizationGuard")
            .field("device", &self.device)
            .field("slot", &self.slot)
            .field("value", &*self.value)
            .finish()
    }
}

impl<R> Deref for RealizationGuard<R> {
    type Target = R;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

/// A GPU resource with lazily built per-device realizations.
pub struct Resource<F: ResourceFactory> {
    id: ResourceId,
    factory: F,
    cells: RwLock<FxHashMap<DeviceId, Arc<DeviceCell<F::Realization>>>>,
    disposed: AtomicBool,
    builds: AtomicUsize,
    self_ref: Weak<Self>,
}

impl<F: ResourceFactory> Resource<F> {
    /// Wraps a factory. No device work happens here.
    #[must_use]
    pub fn new(factory: F) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            id: ResourceId::next(),
            factory,
            cells: RwLock::new(FxHashMap::default()),
            disposed: AtomicBool::new(false),
            builds: AtomicUsize::new(0),
            self_ref: weak.clone(),
        })
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ResourceId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        self.factory.label()
    }

    #[inline]
    #[must_use]
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Number of successful builds over the resource's lifetime.
    #[inline]
    #[must_use]
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }

    #[inline]
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn cell(&self, device: DeviceId) -> Option<Arc<DeviceCell<F::Realization>>> {
        self.cells.read().get(&device).cloned()
    }

    fn cell_or_insert(&self, device: &Arc<DeviceContext>) -> Arc<DeviceCell<F::Realization>> {
        if let Some(cell) = self.cell(device.id()) {
            return cell;
        }
        let mut cells = self.cells.write();
        Arc::clone(
            cells
                .entry(device.id())
                .or_insert_with(|| Arc::new(DeviceCell::new(Arc::clone(device)))),
        )
    }

    fn disposed_error(&self) -> LumenError {
        LumenError::ObjectDisposed {
            resource: self.label().to_string(),
        }
    }

    /// Derived from the per-device slot table on every call.
    #[must_use]
    pub fn is_loaded(&self, device: &DeviceHandle) -> bool {
        self.device_resource_index(device).is_some()
    }

    #[must_use]
    pub fn device_resource_index(&self, device: &DeviceHandle) -> Option<SlotIndex> {
        let cell = self.cell(device.id())?;
        cell.slot()
    }

    /// Devices this resource is currently realized on.
    #[must_use]
    pub fn loaded_devices(&self) -> SmallVec<[DeviceId; 4]> {
        let cells = self.cells.read();
        cells
            .iter()
            .filter(|(_, cell)| cell.slot().is_some())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Realizes the resource on `device` unless it already is.
    ///
    /// At most one thread builds a given (resource, device) pair at a time;
    /// concurrent callers wait and then observe the finished realization.
    pub fn ensure_loaded(&self, device: &Arc<DeviceContext>) -> Result<EnsureResult> {
        if self.is_disposed() {
            return Err(self.disposed_error());
        }
        if device.is_lost() {
            return Err(LumenError::device_lost(device.id(), "device is marked lost"));
        }

        let cell = self.cell_or_insert(device);
        let _load = cell.load_lock.lock();

        if let Some(slot) = cell.slot() {
            return Ok(EnsureResult::existing(slot));
        }
        // Re-checked under the load lock: `dispose` may have raced us here.
        if self.is_disposed() {
            return Err(self.disposed_error());
        }
        if device.is_lost() {
            return Err(LumenError::device_lost(device.id(), "device is marked lost"));
        }

        let value = match self.factory.build(device.handle()) {
            Ok(value) => value,
            Err(err) => {
                if err.is_fatal() {
                    device.mark_lost(&err.to_string());
                }
                log::debug!(
                    "Building {} ({}) on {} failed: {err}",
                    self.label(),
                    self.id,
                    device.handle()
                );
                return Err(err);
            }
        };
        self.builds.fetch_add(1, Ordering::Relaxed);

        let weak: Weak<dyn DeviceResource> = self.self_ref.clone();
        let slot = device.registry().register(self.id, weak);
        // A concurrent device removal may have swept the registry before we
        // registered; never leave a realization behind on a lost device.
        if device.is_lost() {
            device.registry().remove(slot, self.id);
            self.factory.release(device.handle(), value);
            return Err(LumenError::device_lost(device.id(), "device lost during realization"));
        }
        *cell.state.write() = Some(Realized {
            slot,
            value: Arc::new(value),
        });

        log::debug!(
            "Realized {} ({}) on {} at slot {slot}",
            self.label(),
            self.id,
            device.handle()
        );
        Ok(EnsureResult::created(slot))
    }

    /// Read access to the realization on `device`.
    ///
    /// Never loads implicitly: an unrealized resource yields
    /// [`LumenError::ResourceNotLoaded`].
    pub fn realization(&self, device: &DeviceHandle) -> Result<RealizationGuard<F::Realization>> {
        let not_loaded = || LumenError::ResourceNotLoaded {
            resource: self.label().to_string(),
            device: device.id(),
        };

        let cell = self.cell(device.id()).ok_or_else(not_loaded)?;
        let state = cell.state.read();
        let realized = state.as_ref().ok_or_else(not_loaded)?;
        // Taken while the state lock is held so an unload cannot slip between.
        let lease = cell.barrier.enter();
        Ok(RealizationGuard {
            value: Arc::clone(&realized.value),
            device: device.id(),
            slot: realized.slot,
            _lease: lease,
        })
    }

    /// Releases the realization on `device`, waiting for in-flight readers.
    ///
    /// No-op (returns `false`) when not loaded there; safe to call repeatedly.
    pub fn unload(&self, device: &DeviceHandle) -> bool {
        let Some(cell) = self.cell(device.id()) else {
            return false;
        };
        let released = cell.release(self.id, &self.factory);
        if released {
            log::debug!("Released {} ({}) on {}", self.label(), self.id, device);
        }
        // A lost device will never be ensured again; forget its cell.
        if cell.context.is_lost() {
            self.cells.write().remove(&device.id());
        }
        released
    }

    /// Releases the realizations on every device.
    pub fn unload_all(&self) -> usize {
        let devices: SmallVec<[DeviceHandle; 4]> = self
            .cells
            .read()
            .values()
            .map(|cell| cell.context.handle().clone())
            .collect();
        devices.iter().filter(|device| self.unload(device)).count()
    }

    /// Unloads everywhere and refuses any further `ensure_loaded`.
    ///
    /// Returns the number of realizations released; `0` on repeated calls.
    pub fn dispose(&self) -> usize {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return 0;
        }
        let released = self.unload_all();
        log::debug!("Disposed {} ({})", self.label(), self.id);
        released
    }
}

impl<F: ResourceFactory> DeviceResource for Resource<F> {
    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn label(&self) -> &str {
        Resource::label(self)
    }

    fn is_loaded(&self, device: &DeviceHandle) -> bool {
        Resource::is_loaded(self, device)
    }

    fn device_resource_index(&self, device: &DeviceHandle) -> Option<SlotIndex> {
        Resource::device_resource_index(self, device)
    }

    fn ensure_loaded(&self, device: &Arc<DeviceContext>) -> Result<EnsureResult> {
        Resource::ensure_loaded(self, device)
    }

    fn unload(&self, device: &DeviceHandle) -> bool {
        Resource::unload(self, device)
    }

    fn unload_all(&self) -> usize {
        Resource::unload_all(self)
    }

    fn is_disposed(&self) -> bool {
        Resource::is_disposed(self)
    }
}

impl<F: ResourceFactory> Drop for Resource<F> {
    fn drop(&mut self) {
        self.unload_all();
    }
}

impl<F: ResourceFactory> fmt::Debug for Resource<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("id", &self.id)
            .field("label", &self.label())
            .field("loaded_on", &self.loaded_devices())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
