//! Exposes the settings used to configure descriptor banks.

use anyhow::Result;

use crate::Error;

/// Default amount of descriptor sets a single physical `VkDescriptorPool` can hold.
pub const DEFAULT_SETS_PER_POOL: u32 = 64;
/// Default maximum score difference for a bank to be reused by a differently sized footprint.
pub const DEFAULT_SCORE_THRESHOLD: u32 = 3;
/// Default amount of descriptor sets an allocator requests at once.
// Prefer small grow rates to avoid saturating pools with barely used set layouts.
pub const DEFAULT_GROW_RATE: usize = 16;

/// Settings controlling how banks are matched, sized and grown.
///
/// # Example
/// ```
/// # use descriptor_banks::*;
/// let settings = DescriptorPoolSettings {
///     sets_per_pool: 128,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DescriptorPoolSettings {
    /// Amount of descriptor sets every physical pool is sized for. Each descriptor type in a bank's
    /// footprint is multiplied by this value to obtain the pool size. Only used by the Vulkan backed
    /// [`Device`](crate::Device), other [`DescriptorDevice`](crate::DescriptorDevice) implementations
    /// report their own value.
    pub sets_per_pool: u32,
    /// A bank is only reused for a footprint when their scores differ by strictly less than this value.
    /// This keeps tiny shaders from being placed in banks sized for much larger ones.
    pub score_threshold: u32,
    /// Amount of descriptor sets a [`DescriptorAllocator`](crate::DescriptorAllocator) materializes
    /// whenever it runs out of committed sets.
    pub grow_rate: usize,
}

impl Default for DescriptorPoolSettings {
    fn default() -> Self {
        Self {
            sets_per_pool: DEFAULT_SETS_PER_POOL,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            grow_rate: DEFAULT_GROW_RATE,
        }
    }
}

impl DescriptorPoolSettings {
    /// Check that all values are usable.
    /// # Errors
    /// * Fails if any of the values is zero. A zero score threshold would never match any bank.
    pub fn validate(&self) -> Result<()> {
        if self.sets_per_pool == 0 {
            anyhow::bail!(Error::InvalidSettings("sets_per_pool must be at least 1"));
        }
        if self.score_threshold == 0 {
            anyhow::bail!(Error::InvalidSettings("score_threshold must be at least 1"));
        }
        if self.grow_rate == 0 {
            anyhow::bail!(Error::InvalidSettings("grow_rate must be at least 1"));
        }
        Ok(())
    }
}

/// Convenience builder for [`DescriptorPoolSettings`].
///
/// For information about each of the fields, see [`DescriptorPoolSettings`].
/// # Example
/// ```
/// # use descriptor_banks::*;
/// let settings = DescriptorPoolSettingsBuilder::new()
///     .sets_per_pool(128u32)
///     .grow_rate(8usize)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Default)]
pub struct DescriptorPoolSettingsBuilder {
    inner: DescriptorPoolSettings,
}

impl DescriptorPoolSettingsBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Amount of descriptor sets each physical pool can hold.
    pub fn sets_per_pool(mut self, sets: impl Into<u32>) -> Self {
        self.inner.sets_per_pool = sets.into();
        self
    }

    /// Maximum (exclusive) score difference between a request and a reusable bank.
    pub fn score_threshold(mut self, threshold: impl Into<u32>) -> Self {
        self.inner.score_threshold = threshold.into();
        self
    }

    /// Amount of sets allocated at once by each allocator.
    pub fn grow_rate(mut self, rate: impl Into<usize>) -> Self {
        self.inner.grow_rate = rate.into();
        self
    }

    /// Build the resulting settings.
    /// # Errors
    /// * Fails if any of the values is zero.
    pub fn build(self) -> Result<DescriptorPoolSettings> {
        self.inner.validate()?;
        Ok(self.inner)
    }
}
