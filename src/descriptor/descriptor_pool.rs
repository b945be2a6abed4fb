//! A physical descriptor pool together with the bookkeeping needed to recycle it safely.

use std::sync::Arc;

use anyhow::Result;
use ash::vk;

use crate::{DescriptorBankInfo, DescriptorDevice, Error};

/// Snapshot of the bookkeeping of one physical pool in a bank.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PhysicalPoolStatus {
    /// Raw handle of the pool.
    pub handle: vk::DescriptorPool,
    /// Tick of the most recent submission that may use sets from this pool.
    pub last_submission_id: u64,
    /// Whether the last allocation attempt on this pool ran out of pool memory.
    pub previously_out_of_memory: bool,
}

/// One `VkDescriptorPool` owned by a bank.
#[derive(Derivative)]
#[derivative(Debug)]
pub(super) struct PhysicalPool<D: DescriptorDevice> {
    #[derivative(Debug = "ignore")]
    device: Arc<D>,
    handle: vk::DescriptorPool,
    pub(super) last_submission_id: u64,
    pub(super) previously_out_of_memory: bool,
}

impl<D: DescriptorDevice> PhysicalPool<D> {
    /// Create a new pool able to hold `sets_per_pool` sets of the given footprint.
    /// # Errors
    /// * Fails with [`Error::PoolCreationFailed`] if the driver could not create the pool.
    pub(super) fn new(device: Arc<D>, info: &DescriptorBankInfo) -> Result<Self> {
        let sets_per_pool = device.sets_per_pool();
        let sizes = info.pool_sizes(sets_per_pool);
        // SAFETY: the size table lives for the duration of the call.
        let handle = unsafe { device.create_descriptor_pool(&sizes, sets_per_pool) }.map_err(Error::PoolCreationFailed)?;
        Ok(Self {
            device,
            handle,
            last_submission_id: 0,
            previously_out_of_memory: false,
        })
    }

    /// Allocate one set per layout.
    pub(super) fn allocate(&self, layouts: &[vk::DescriptorSetLayout]) -> ash::prelude::VkResult<Vec<vk::DescriptorSet>> {
        // SAFETY: handle was created by this device, and the owning bank serializes access to it.
        unsafe { self.device.allocate_descriptor_sets(self.handle, layouts) }
    }

    /// Return all sets to the pool and clear the bookkeeping.
    /// # Errors
    /// * Fails with [`Error::PoolResetFailed`] if the driver could not reset the pool.
    pub(super) fn reset(&mut self) -> Result<()> {
        debug!("Resetting VkDescriptorPool {:p}", self.handle);
        // SAFETY: handle was created by this device. The caller verified no pending submission uses its sets.
        unsafe { self.device.reset_descriptor_pool(self.handle) }.map_err(Error::PoolResetFailed)?;
        self.previously_out_of_memory = false;
        self.last_submission_id = 0;
        Ok(())
    }

    pub(super) fn status(&self) -> PhysicalPoolStatus {
        PhysicalPoolStatus {
            handle: self.handle,
            last_submission_id: self.last_submission_id,
            previously_out_of_memory: self.previously_out_of_memory,
        }
    }
}

impl<D: DescriptorDevice> Drop for PhysicalPool<D> {
    fn drop(&mut self) {
        // SAFETY: the pool is owned by self and dropped together with its bank.
        unsafe {
            self.device.destroy_descriptor_pool(self.handle);
        }
    }
}
