//! Resource Lifecycle
//!
//! CPU-side resource objects and their per-device GPU realizations:
//!
//! - [`Resource`]: a [`ResourceFactory`] plus one realization slot per device
//! - [`ResourceRegistry`]: per-device table of realized resources, used for
//!   bulk unloading on device loss
//! - [`SlotArena`]: the free-list arena behind registry slot indices
//! - [`DrainBarrier`]: blocks unloading until in-flight readers are done
//!
//! # Example
//!
//! ```rust,ignore
//! use lumen::resources::{Resource, ResourceFactory};
//!
//! struct Mesh { vertices: Vec<[f32; 3]> }
//!
//! impl ResourceFactory for Mesh {
//!     type Realization = GpuBuffer;
//!     fn label(&self) -> &str { "Mesh" }
//!     fn build(&self, device: &DeviceHandle) -> lumen::Result<GpuBuffer> {
//!         backend.create_vertex_buffer(device, &self.vertices)
//!     }
//! }
//!
//! let mesh = Resource::new(Mesh { vertices });
//! mesh.ensure_loaded(&device)?;
//! let buffer = mesh.realization(device.handle())?;
//! ```

pub mod arena;
pub mod drain;
pub mod registry;
pub mod resource;

pub use arena::{SlotArena, SlotIndex};
pub use drain::{DrainBarrier, ReadLease};
pub use registry::ResourceRegistry;
pub use resource::{
    DeviceResource, EnsureResult, RealizationGuard, Resource, ResourceFactory, ResourceId,
};
