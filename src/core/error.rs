//! Exposes the crate error type

use std::sync::PoisonError;

use ash;
use thiserror::Error;

/// Error type that descriptor bank operations can return.
///
/// Only fatal conditions are represented here. Running out of pool memory or fragmenting a pool is
/// handled internally by resetting or growing the bank and never reaches the caller.
#[derive(Error, Debug)]
pub enum Error {
    /// The driver failed to create a new `VkDescriptorPool`.
    #[error("Failed to create descriptor pool: `{0}`")]
    PoolCreationFailed(ash::vk::Result),
    /// The driver failed to reset a `VkDescriptorPool` that was eligible for reuse.
    #[error("Failed to reset descriptor pool: `{0}`")]
    PoolResetFailed(ash::vk::Result),
    /// Allocating descriptor sets failed in a way that cannot be recovered from. This is returned when
    /// a freshly created pool cannot satisfy the request, or when the driver reports anything other
    /// than running out of pool memory.
    #[error("Failed to allocate descriptor sets: `{0}`")]
    AllocationFailed(ash::vk::Result),
    /// The driver reported success but handed back fewer sets than requested.
    #[error("Requested {requested} descriptor sets, but the driver returned {received}")]
    IncompleteAllocation {
        /// Number of sets that was requested
        requested: usize,
        /// Number of sets that was returned
        received: usize,
    },
    /// Invalid descriptor pool settings.
    #[error("Invalid descriptor pool settings: {0}")]
    InvalidSettings(&'static str),
    /// Poisoned lock
    #[error("Poisoned lock")]
    PoisonError,
}

impl<T> From<PoisonError<T>> for Error {
    fn from(_: PoisonError<T>) -> Self {
        Error::PoisonError
    }
}
