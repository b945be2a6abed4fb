//! The registry owns every descriptor bank and matches descriptor footprints to them.

use std::sync::{Arc, RwLock};

use anyhow::Result;
use ash::vk;

use crate::{
    AtomicTimeline, DescriptorAllocator, DescriptorBank, DescriptorBankInfo, DescriptorDevice, DescriptorPoolSettings, Device,
    Error, ShaderDescriptorReport, SubmissionTracker,
};

type BankList<D> = Vec<(DescriptorBankInfo, Arc<DescriptorBank<D>>)>;

/// Owns all descriptor banks for one device. Banks are created on demand and never removed, so there is one
/// bank per distinct footprint class for the lifetime of the registry.
///
/// Bank lookup takes a shared lock, so allocators can be created from many threads at once. Creating a new
/// bank takes an exclusive lock.
///
/// # Example
/// ```
/// # use std::sync::Arc;
/// # use descriptor_banks::*;
/// # use anyhow::Result;
/// fn make_allocator(device: Device, layout: vk::DescriptorSetLayout) -> Result<DescriptorAllocator> {
///     let timeline = Arc::new(AtomicTimeline::new());
///     let registry = DescriptorPoolRegistry::new(Arc::new(device), timeline, DescriptorPoolSettings::default())?;
///     let report = ShaderDescriptorReport {
///         uniform_buffers: 2,
///         sampled_images: 4,
///         ..Default::default()
///     };
///     registry.allocator_for_shader(layout, &report)
/// }
/// ```
#[derive(Derivative)]
#[derivative(Debug)]
pub struct DescriptorPoolRegistry<D: DescriptorDevice = Device, T: SubmissionTracker = AtomicTimeline> {
    #[derivative(Debug = "ignore")]
    device: Arc<D>,
    #[derivative(Debug = "ignore")]
    tracker: Arc<T>,
    settings: DescriptorPoolSettings,
    banks: RwLock<BankList<D>>,
}

impl<D: DescriptorDevice + 'static, T: SubmissionTracker + 'static> DescriptorPoolRegistry<D, T> {
    /// Create a new, empty registry.
    /// # Errors
    /// * Fails if the settings are invalid.
    pub fn new(device: Arc<D>, tracker: Arc<T>, settings: DescriptorPoolSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            device,
            tracker,
            settings,
            banks: RwLock::new(Vec::new()),
        })
    }

    /// Create an allocator for a set layout used by a pipeline with the given shaders.
    /// # Errors
    /// * Fails if a new bank was needed and its first pool could not be created.
    pub fn allocator(&self, layout: vk::DescriptorSetLayout, reports: &[ShaderDescriptorReport]) -> Result<DescriptorAllocator<D>> {
        self.allocator_with_info(layout, &DescriptorBankInfo::from_reports(reports))
    }

    /// Create an allocator for a set layout used by a single shader.
    /// # Errors
    /// * Fails if a new bank was needed and its first pool could not be created.
    pub fn allocator_for_shader(&self, layout: vk::DescriptorSetLayout, report: &ShaderDescriptorReport) -> Result<DescriptorAllocator<D>> {
        self.allocator_with_info(layout, &DescriptorBankInfo::new(report))
    }

    /// Create an allocator for a set layout with a known footprint.
    /// # Errors
    /// * Fails if a new bank was needed and its first pool could not be created.
    pub fn allocator_with_info(&self, layout: vk::DescriptorSetLayout, info: &DescriptorBankInfo) -> Result<DescriptorAllocator<D>> {
        let bank = self.bank(info)?;
        Ok(DescriptorAllocator::new(bank, self.tracker.clone(), layout, self.settings.grow_rate))
    }

    /// Find a bank that can serve `info`, or create a new one.
    ///
    /// A bank matches if its score differs from the request by less than the configured threshold, and it holds at
    /// least as many descriptors of every type. The first matching bank in creation order is returned.
    ///
    /// Two threads missing at the same time may both create a bank for the same footprint. This wastes some pool
    /// space, but is otherwise harmless.
    /// # Errors
    /// * Fails if a new bank was needed and its first pool could not be created.
    pub fn bank(&self, info: &DescriptorBankInfo) -> Result<Arc<DescriptorBank<D>>> {
        {
            let banks = self.banks.read().map_err(Error::from)?;
            let found = banks
                .iter()
                .find(|(existing, _)| existing.matches(info, self.settings.score_threshold));
            if let Some((_, bank)) = found {
                return Ok(bank.clone());
            }
        }

        let mut banks = self.banks.write().map_err(Error::from)?;
        let bank = Arc::new(DescriptorBank::new(self.device.clone(), *info)?);
        banks.push((*info, bank.clone()));
        debug!("Created descriptor bank #{} for {:?}", banks.len(), info);
        Ok(bank)
    }

    /// Amount of banks created so far.
    pub fn bank_count(&self) -> Result<usize> {
        Ok(self.banks.read().map_err(Error::from)?.len())
    }

    /// The settings this registry was created with.
    pub fn settings(&self) -> &DescriptorPoolSettings {
        &self.settings
    }

    /// The submission tracker used to tag and recycle pools.
    pub fn tracker(&self) -> &Arc<T> {
        &self.tracker
    }
}
