//! Banked, fence-aware Vulkan descriptor set allocation
//!
//! Allocating descriptor sets is expensive, bounded by pool capacity and can fail when a pool runs out of memory.
//! Sets cannot be freed individually, and a pool can only be reset once the GPU no longer reads any set from it.
//! This crate turns a stream of descriptor set requests into a small number of physical descriptor pools, reused
//! across frames based on submission ids.
//!
//! To get started, import everything from the prelude
//! ```
//! use descriptor_banks::prelude::*;
//! ```
//!
//! # Example
//!
//! Wrap your logical device, and create a registry together with a submission tracker. The tracker must be advanced
//! by whatever submits command buffers.
//! ```
//! # use std::sync::Arc;
//! # use descriptor_banks::*;
//! # use anyhow::Result;
//! fn setup(device: ash::Device) -> Result<DescriptorPoolRegistry> {
//!     let settings = DescriptorPoolSettingsBuilder::new()
//!         .sets_per_pool(64u32)
//!         .grow_rate(16usize)
//!         .build()?;
//!     let device = Device::new(device, &settings)?;
//!     let timeline = Arc::new(AtomicTimeline::new());
//!     DescriptorPoolRegistry::new(Arc::new(device), timeline, settings)
//! }
//! ```
//! Every frame, commit sets from allocators and advance the timeline on submission.
//! ```
//! # use descriptor_banks::*;
//! # use anyhow::Result;
//! fn frame(registry: &DescriptorPoolRegistry, allocator: &mut DescriptorAllocator) -> Result<()> {
//!     let set = allocator.commit()?;
//!     // Record and submit work using `set`, signaling `tick` when done.
//!     let tick = registry.tracker().next_tick();
//!     // Later, once the fence for `tick` is signaled:
//!     registry.tracker().signal_completed(tick);
//!     Ok(())
//! }
//! ```
//! For further details, check out the following modules
//! - [`descriptor`] for banks, allocators and the registry.
//! - [`sync`] for submission tracking.
//! - [`resource`] for the chunked slot pool allocators are built on.
//! - [`core`] for the driver interface, settings and errors.

#[macro_use]
extern crate derivative;
#[macro_use]
extern crate log;

pub mod prelude;
pub use crate::prelude::*;

pub mod core;
pub mod descriptor;
pub mod resource;
pub mod sync;
