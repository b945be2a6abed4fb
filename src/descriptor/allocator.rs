//! Per set-layout allocator handing out descriptor sets from a shared bank.

use std::sync::Arc;

use anyhow::Result;
use ash::vk;

use crate::resource::pool::ChunkedPool;
use crate::{DescriptorBank, DescriptorDevice, Device, SubmissionTracker};

/// Hands out descriptor sets of a single layout. Sets are allocated from the bank in chunks of the configured
/// grow rate, so most calls to [`DescriptorAllocator::commit()`] do not touch the bank at all.
///
/// Obtain one through [`DescriptorPoolRegistry::allocator()`](crate::DescriptorPoolRegistry::allocator).
///
/// A returned set stays valid until the physical pool it came from is reset. This only happens once that pool
/// ran out of memory and every submission tagged while allocating from it has completed, so sets must not be
/// kept across submissions.
///
/// A chunk only serves commits made while the tick it was allocated at is still current. Once the tracker moves
/// to the next tick, the unused rest of the chunk is dropped, so every set is handed out from a pool stamped with
/// the submission it is recorded into.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct DescriptorAllocator<D: DescriptorDevice = Device> {
    #[derivative(Debug = "ignore")]
    bank: Arc<DescriptorBank<D>>,
    #[derivative(Debug = "ignore")]
    tracker: Arc<dyn SubmissionTracker>,
    layout: vk::DescriptorSetLayout,
    sets: ChunkedPool<vk::DescriptorSet>,
}

impl<D: DescriptorDevice + 'static> DescriptorAllocator<D> {
    pub(crate) fn new<T: SubmissionTracker + 'static>(
        bank: Arc<DescriptorBank<D>>,
        tracker: Arc<T>,
        layout: vk::DescriptorSetLayout,
        grow_rate: usize,
    ) -> Self {
        let chunk_bank = bank.clone();
        let chunk_tracker = tracker.clone();
        let sets = ChunkedPool::new(grow_rate, move |count| {
            chunk_bank.allocate_descriptors(layout, count, chunk_tracker.as_ref())
        });
        Self {
            bank,
            tracker,
            layout,
            sets,
        }
    }

    /// Get the next descriptor set. Allocates a new chunk of sets from the bank if needed.
    /// # Errors
    /// * Fails if the bank could not satisfy the allocation. See
    /// [`DescriptorBank::allocate_descriptors()`](crate::DescriptorBank::allocate_descriptors).
    pub fn commit(&mut self) -> Result<vk::DescriptorSet> {
        self.sets.commit(self.tracker.current_tick())
    }

    /// Amount of descriptor sets committed so far.
    pub fn committed(&self) -> usize {
        self.sets.committed()
    }

    /// Amount of sets left in the current chunk.
    pub fn remaining(&self) -> usize {
        self.sets.remaining()
    }

    /// The descriptor set layout of all sets handed out by this allocator.
    pub fn layout(&self) -> vk::DescriptorSetLayout {
        self.layout
    }

    /// The bank sets are allocated from.
    pub fn bank(&self) -> &Arc<DescriptorBank<D>> {
        &self.bank
    }
}
