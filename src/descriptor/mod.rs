//! This module handles everything related to allocating descriptor sets.
//!
//! Descriptor pools are grouped into *banks*. A bank is identified by its [`DescriptorBankInfo`](crate::DescriptorBankInfo),
//! the amount of descriptors of each type a set needs. Pipelines with similar footprints share a bank, so that
//! a handful of physical pools can serve every set layout in the application.
//!
//! The [`DescriptorPoolRegistry`](crate::DescriptorPoolRegistry) owns all banks. It hands out
//! [`DescriptorAllocator`](crate::DescriptorAllocator)s, which commit descriptor sets one at a time.
//!
//! Pools are recycled without ever waiting on the GPU. Each pool is tagged with the tick of the last submission
//! that used it, and is only reset after that tick has completed. See
//! [`DescriptorBank::allocate_descriptors()`](crate::DescriptorBank::allocate_descriptors) for the exact strategy.
//!
//! # Example
//!
//! ```
//! # use std::sync::Arc;
//! # use descriptor_banks::*;
//! # use anyhow::Result;
//! fn record<D: DescriptorDevice + 'static>(registry: &DescriptorPoolRegistry<D>, layout: vk::DescriptorSetLayout) -> Result<()> {
//!     let shaders = [
//!         ShaderDescriptorReport { uniform_buffers: 1, ..Default::default() },
//!         ShaderDescriptorReport { uniform_buffers: 1, sampled_images: 2, ..Default::default() },
//!     ];
//!     let mut allocator = registry.allocator(layout, &shaders)?;
//!     let set = allocator.commit()?;
//!     // Write to and bind the set
//!     Ok(())
//! }
//! ```

pub mod allocator;
pub mod bank;
pub mod bank_info;
pub mod registry;

mod descriptor_pool;

pub use descriptor_pool::PhysicalPoolStatus;

static_assertions::assert_impl_all!(crate::DescriptorPoolRegistry: Send, Sync);
static_assertions::assert_impl_all!(crate::DescriptorBank<crate::Device>: Send, Sync);
static_assertions::assert_impl_all!(crate::DescriptorAllocator: Send);
