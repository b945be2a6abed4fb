//! Submission tracking used to decide when descriptor pools can be recycled.
//!
//! Every batch of GPU work is tagged with a monotonically increasing id, the *tick*. A descriptor pool remembers
//! the tick of the last submission that used sets from it, and may only be reset once the GPU has completed
//! that tick. Querying completion never blocks.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use ash::vk;

use crate::Device;

/// Source of submission ids for descriptor banks.
pub trait SubmissionTracker: Send + Sync {
    /// The id of the submission currently being recorded. Work recorded now will be tagged with this id.
    fn current_tick(&self) -> u64;

    /// The highest submission id that is known to have completed on the GPU. This must never decrease,
    /// and must not block waiting for GPU progress.
    fn last_completed(&self) -> u64;
}

/// Host-side timeline. The submission layer calls [`AtomicTimeline::next_tick()`] when it submits a batch,
/// and [`AtomicTimeline::signal_completed()`] once it has observed that a batch finished (for example after
/// its [`VkFence`](vk::Fence) was signaled).
///
/// Ticks start at `1`, and tick `0` is considered complete from the start.
/// # Example
/// ```
/// # use descriptor_banks::*;
/// let timeline = AtomicTimeline::new();
/// let submitted = timeline.next_tick();
/// assert_eq!(submitted, 1);
/// assert_eq!(timeline.current_tick(), 2);
/// timeline.signal_completed(submitted);
/// assert_eq!(timeline.last_completed(), 1);
/// ```
#[derive(Debug)]
pub struct AtomicTimeline {
    current: AtomicU64,
    completed: AtomicU64,
}

impl Default for AtomicTimeline {
    fn default() -> Self {
        Self::new()
    }
}

impl AtomicTimeline {
    /// Create a new timeline with nothing submitted yet.
    pub fn new() -> Self {
        Self {
            current: AtomicU64::new(1),
            completed: AtomicU64::new(0),
        }
    }

    /// Close the current tick and advance to the next one. Returns the tick that was just submitted.
    pub fn next_tick(&self) -> u64 {
        self.current.fetch_add(1, Ordering::AcqRel)
    }

    /// Mark every submission up to and including `tick` as completed. Lower values than the current
    /// completed tick are ignored.
    pub fn signal_completed(&self, tick: u64) {
        self.completed.fetch_max(tick, Ordering::AcqRel);
    }
}

impl SubmissionTracker for AtomicTimeline {
    fn current_tick(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }

    fn last_completed(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }
}

/// Submission tracker backed by a Vulkan timeline semaphore. Each submission should signal
/// the value returned by [`TimelineSemaphore::next_tick()`]. Completion is queried with
/// `vkGetSemaphoreCounterValue`, which does not wait.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct TimelineSemaphore {
    #[derivative(Debug = "ignore")]
    device: Device,
    handle: vk::Semaphore,
    current: AtomicU64,
    completed: AtomicU64,
}

impl TimelineSemaphore {
    /// Create a new timeline semaphore with initial value `0`.
    /// # Errors
    /// * Fails if the semaphore could not be created, for example because timeline semaphores are not enabled.
    pub fn new(device: Device) -> Result<Self> {
        let mut type_info = vk::SemaphoreTypeCreateInfo::builder()
            .semaphore_type(vk::SemaphoreType::TIMELINE)
            .initial_value(0);
        let info = vk::SemaphoreCreateInfo::builder().push_next(&mut type_info);
        let handle = unsafe { device.create_semaphore(&info, None)? };
        #[cfg(feature = "log-objects")]
        trace!("Created new timeline VkSemaphore {handle:p}");
        Ok(Self {
            device,
            handle,
            current: AtomicU64::new(1),
            completed: AtomicU64::new(0),
        })
    }

    /// Get unsafe access to the underlying `VkSemaphore` handle.
    /// # Safety
    /// The semaphore must only be signaled with values obtained from [`Self::next_tick()`].
    pub unsafe fn handle(&self) -> vk::Semaphore {
        self.handle
    }

    /// Close the current tick and advance to the next one. Returns the value the submission must signal.
    pub fn next_tick(&self) -> u64 {
        self.current.fetch_add(1, Ordering::AcqRel)
    }
}

impl SubmissionTracker for TimelineSemaphore {
    fn current_tick(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }

    fn last_completed(&self) -> u64 {
        // SAFETY: handle is a valid timeline semaphore owned by self.
        match unsafe { self.device.get_semaphore_counter_value(self.handle) } {
            Ok(value) => {
                self.completed.fetch_max(value, Ordering::AcqRel);
                self.completed.load(Ordering::Acquire)
            }
            Err(err) => {
                warn!("Failed to query timeline semaphore value: {err}");
                self.completed.load(Ordering::Acquire)
            }
        }
    }
}

impl Drop for TimelineSemaphore {
    fn drop(&mut self) {
        #[cfg(feature = "log-objects")]
        trace!("Destroying VkSemaphore {:p}", self.handle);
        unsafe {
            self.device.destroy_semaphore(self.handle, None);
        }
    }
}
