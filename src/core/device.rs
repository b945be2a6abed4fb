//! Exposes the driver interface descriptor banks are built on, and a Vulkan implementation of it.

use std::ops::Deref;
use std::sync::Arc;

use anyhow::Result;
use ash::prelude::VkResult;
use ash::vk;

use crate::DescriptorPoolSettings;

/// The driver calls needed to create, allocate from and recycle descriptor pools.
///
/// This is implemented for [`Device`], but can be implemented by any other driver wrapper, for example
/// to run the allocation logic against a software model of a driver.
///
/// # Safety
/// All methods taking a pool handle require that the handle was created by the same implementation and
/// has not been destroyed yet. Access to a single pool must be externally synchronized.
pub trait DescriptorDevice: Send + Sync {
    /// Amount of descriptor sets each physical pool is created for.
    fn sets_per_pool(&self) -> u32;

    /// Create a new descriptor pool with the given size table and set capacity. No pool flags are set,
    /// so sets can only be returned by resetting the whole pool.
    unsafe fn create_descriptor_pool(&self, sizes: &[vk::DescriptorPoolSize], max_sets: u32) -> VkResult<vk::DescriptorPool>;

    /// Allocate one descriptor set per layout in `layouts` from `pool`.
    ///
    /// Running out of pool space must be reported as [`vk::Result::ERROR_OUT_OF_POOL_MEMORY`]
    /// or [`vk::Result::ERROR_FRAGMENTED_POOL`]. Any other error is considered fatal.
    unsafe fn allocate_descriptor_sets(
        &self,
        pool: vk::DescriptorPool,
        layouts: &[vk::DescriptorSetLayout],
    ) -> VkResult<Vec<vk::DescriptorSet>>;

    /// Return every descriptor set allocated from `pool` back to it.
    unsafe fn reset_descriptor_pool(&self, pool: vk::DescriptorPool) -> VkResult<()>;

    /// Destroy `pool` and every descriptor set allocated from it.
    unsafe fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool);
}

/// Whether an allocation result signals a pool that is full or fragmented. These errors are recoverable by
/// allocating from another pool.
pub fn is_out_of_pool_memory(result: vk::Result) -> bool {
    matches!(result, vk::Result::ERROR_OUT_OF_POOL_MEMORY | vk::Result::ERROR_FRAGMENTED_POOL)
}

#[derive(Derivative)]
#[derivative(Debug)]
struct DeviceInner {
    #[derivative(Debug = "ignore")]
    handle: ash::Device,
    sets_per_pool: u32,
}

/// Wrapper around a `VkDevice` used to manage descriptor pools. Internal state is wrapped in an
/// `Arc<DeviceInner>`, so this is safe to clone.
///
/// The logical device itself is not owned. It must be kept alive as long as any bank created through this
/// wrapper, and destroyed by the application afterwards.
#[derive(Debug, Clone)]
pub struct Device {
    inner: Arc<DeviceInner>,
}

impl Device {
    /// Wrap an existing logical device.
    /// # Errors
    /// * Fails if the settings are invalid.
    pub fn new(handle: ash::Device, settings: &DescriptorPoolSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            inner: Arc::new(DeviceInner {
                handle,
                sets_per_pool: settings.sets_per_pool,
            }),
        })
    }

    /// Get unsafe access to the underlying `VkDevice` handle.
    /// # Safety
    /// Any vulkan calls that mutate this handle may lead to undefined behaviour.
    pub unsafe fn handle(&self) -> ash::Device {
        self.inner.handle.clone()
    }
}

impl Deref for Device {
    type Target = ash::Device;

    fn deref(&self) -> &Self::Target {
        &self.inner.handle
    }
}

impl DescriptorDevice for Device {
    fn sets_per_pool(&self) -> u32 {
        self.inner.sets_per_pool
    }

    unsafe fn create_descriptor_pool(&self, sizes: &[vk::DescriptorPoolSize], max_sets: u32) -> VkResult<vk::DescriptorPool> {
        let info = vk::DescriptorPoolCreateInfo::builder()
            .flags(vk::DescriptorPoolCreateFlags::empty())
            .max_sets(max_sets)
            .pool_sizes(sizes);
        let handle = self.inner.handle.create_descriptor_pool(&info, None)?;
        #[cfg(feature = "log-objects")]
        trace!("Created new VkDescriptorPool {handle:p}");
        Ok(handle)
    }

    unsafe fn allocate_descriptor_sets(
        &self,
        pool: vk::DescriptorPool,
        layouts: &[vk::DescriptorSetLayout],
    ) -> VkResult<Vec<vk::DescriptorSet>> {
        let info = vk::DescriptorSetAllocateInfo::builder()
            .descriptor_pool(pool)
            .set_layouts(layouts);
        self.inner.handle.allocate_descriptor_sets(&info)
    }

    unsafe fn reset_descriptor_pool(&self, pool: vk::DescriptorPool) -> VkResult<()> {
        self.inner
            .handle
            .reset_descriptor_pool(pool, vk::DescriptorPoolResetFlags::empty())
    }

    unsafe fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool) {
        #[cfg(feature = "log-objects")]
        trace!("Destroying VkDescriptorPool {pool:p}");
        self.inner.handle.destroy_descriptor_pool(pool, None);
    }
}
