//! A bank groups physical descriptor pools that share one descriptor footprint.
//!
//! Descriptor sets can never be freed individually. Instead, sets are allocated from the newest pool in a bank
//! until it runs out, after which older pools are recycled as a whole once the GPU is done with every submission
//! that used them. Only if no pool can be recycled is a new one created.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use ash::vk;

use crate::core::device::is_out_of_pool_memory;
use crate::descriptor::descriptor_pool::{PhysicalPool, PhysicalPoolStatus};
use crate::{DescriptorBankInfo, DescriptorDevice, Error, SubmissionTracker};

/// A footprint and the physical pools created for it. Banks are created by the
/// [`DescriptorPoolRegistry`](crate::DescriptorPoolRegistry) and shared by every allocator whose footprint they match.
///
/// Pools are only ever appended, and live until the bank is dropped.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct DescriptorBank<D: DescriptorDevice> {
    #[derivative(Debug = "ignore")]
    device: Arc<D>,
    info: DescriptorBankInfo,
    pools: Mutex<Vec<PhysicalPool<D>>>,
}

impl<D: DescriptorDevice> DescriptorBank<D> {
    /// Create a new bank for a footprint, together with its first physical pool.
    /// # Errors
    /// * Fails if the first pool could not be created.
    pub(crate) fn new(device: Arc<D>, info: DescriptorBankInfo) -> Result<Self> {
        let bank = Self {
            device,
            info,
            pools: Mutex::new(Vec::new()),
        };
        {
            let mut pools = bank.pools.lock().map_err(Error::from)?;
            bank.allocate_pool(&mut pools)?;
        }
        Ok(bank)
    }

    /// The footprint every pool in this bank is sized for.
    pub fn info(&self) -> &DescriptorBankInfo {
        &self.info
    }

    /// Amount of physical pools in this bank.
    pub fn pool_count(&self) -> Result<usize> {
        Ok(self.pools.lock().map_err(Error::from)?.len())
    }

    /// Bookkeeping of every physical pool, in creation order.
    pub fn pool_status(&self) -> Result<Vec<PhysicalPoolStatus>> {
        let pools = self.pools.lock().map_err(Error::from)?;
        Ok(pools.iter().map(PhysicalPool::status).collect())
    }

    /// Append a new physical pool and return its index.
    fn allocate_pool(&self, pools: &mut Vec<PhysicalPool<D>>) -> Result<usize> {
        pools.push(PhysicalPool::new(self.device.clone(), &self.info)?);
        Ok(pools.len() - 1)
    }

    /// Allocate `count` descriptor sets with the given layout from this bank.
    ///
    /// Pools are tried in the following order:
    /// 1. The most recently created pool.
    /// 2. The first pool that previously ran out of memory, and whose last submission has completed on the GPU.
    ///    This pool is reset before allocating, which invalidates every set previously allocated from it.
    /// 3. A newly created pool.
    ///
    /// Every pool that is allocated from is tagged with the current tick of `tracker`.
    ///
    /// Allocation from one bank is expected to be serialized by the caller, for example by recording from a single
    /// thread per context. Concurrent calls are serialized on an internal lock, but never wait for the GPU.
    /// # Errors
    /// * Fails if a new pool could not be created, or if a pool could not be reset.
    /// * Fails if a freshly created pool cannot hold the request.
    /// * Fails if the driver reports an error other than running out of pool memory.
    pub fn allocate_descriptors<T: SubmissionTracker + ?Sized>(
        &self,
        layout: vk::DescriptorSetLayout,
        count: usize,
        tracker: &T,
    ) -> Result<Vec<vk::DescriptorSet>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let layouts = vec![layout; count];
        let tick = tracker.current_tick();
        let mut pools = self.pools.lock().map_err(Error::from)?;

        if let Some(pool) = pools.last_mut() {
            match try_allocate(pool, &layouts)? {
                Some(sets) => {
                    pool.last_submission_id = tick;
                    pool.previously_out_of_memory = false;
                    return Ok(sets);
                }
                None => pool.previously_out_of_memory = true,
            }
        }

        let completed = tracker.last_completed();
        for pool in pools.iter_mut() {
            if !pool.previously_out_of_memory || completed < pool.last_submission_id {
                continue;
            }
            pool.reset()?;
            match try_allocate(pool, &layouts)? {
                Some(sets) => {
                    pool.last_submission_id = tick;
                    return Ok(sets);
                }
                None => pool.previously_out_of_memory = true,
            }
        }

        let index = self.allocate_pool(&mut pools)?;
        let pool = &mut pools[index];
        debug!(
            "Descriptor bank with score {} grew to {} pools",
            self.info.score(),
            index + 1
        );
        match pool.allocate(&layouts) {
            Ok(sets) => {
                check_count(&sets, count)?;
                pool.last_submission_id = tick;
                Ok(sets)
            }
            Err(result) => {
                error!("Failed to allocate {count} descriptor sets from a new descriptor pool. Error: {result}");
                Err(anyhow::Error::from(Error::AllocationFailed(result)))
            }
        }
    }
}

/// Allocate from an existing pool. Returns `None` if the pool is full or fragmented.
fn try_allocate<D: DescriptorDevice>(
    pool: &PhysicalPool<D>,
    layouts: &[vk::DescriptorSetLayout],
) -> Result<Option<Vec<vk::DescriptorSet>>> {
    match pool.allocate(layouts) {
        Ok(sets) => {
            check_count(&sets, layouts.len())?;
            Ok(Some(sets))
        }
        Err(result) if is_out_of_pool_memory(result) => Ok(None),
        Err(result) => {
            error!("Failed to allocate {} descriptor sets. Error: {result}", layouts.len());
            Err(anyhow::Error::from(Error::AllocationFailed(result)))
        }
    }
}

fn check_count(sets: &[vk::DescriptorSet], requested: usize) -> Result<()> {
    if sets.len() != requested {
        anyhow::bail!(Error::IncompleteAllocation {
            requested,
            received: sets.len(),
        });
    }
    Ok(())
}
