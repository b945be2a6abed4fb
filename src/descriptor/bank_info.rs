//! Descriptor footprints used to match set layouts to banks.

use ash::vk;

/// Amount of descriptors of each type a single shader uses, as reported by shader reflection.
///
/// Counts are per descriptor set, arrays count as their length.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ShaderDescriptorReport {
    /// `VK_DESCRIPTOR_TYPE_UNIFORM_BUFFER` descriptors
    pub uniform_buffers: u32,
    /// `VK_DESCRIPTOR_TYPE_STORAGE_BUFFER` descriptors
    pub storage_buffers: u32,
    /// `VK_DESCRIPTOR_TYPE_UNIFORM_TEXEL_BUFFER` descriptors
    pub uniform_texel_buffers: u32,
    /// `VK_DESCRIPTOR_TYPE_STORAGE_TEXEL_BUFFER` descriptors
    pub storage_texel_buffers: u32,
    /// `VK_DESCRIPTOR_TYPE_COMBINED_IMAGE_SAMPLER` descriptors
    pub sampled_images: u32,
    /// `VK_DESCRIPTOR_TYPE_STORAGE_IMAGE` descriptors
    pub storage_images: u32,
}

/// Descriptor type footprint of a bank. Every physical pool in a bank can hold this footprint once per set.
///
/// The score is the total descriptor count, and is always derived from the individual counts.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DescriptorBankInfo {
    uniform_buffers: u32,
    storage_buffers: u32,
    uniform_texel_buffers: u32,
    storage_texel_buffers: u32,
    sampled_images: u32,
    storage_images: u32,
    score: u32,
}

impl DescriptorBankInfo {
    /// Create a bank info from a single footprint.
    pub fn new(report: &ShaderDescriptorReport) -> Self {
        Self::from_reports(std::slice::from_ref(report))
    }

    /// Sum the descriptor counts of every shader in a pipeline into one footprint. An empty slice yields
    /// an all-zero footprint.
    pub fn from_reports(reports: &[ShaderDescriptorReport]) -> Self {
        let mut info = reports.iter().fold(Self::default(), |mut info, report| {
            info.uniform_buffers += report.uniform_buffers;
            info.storage_buffers += report.storage_buffers;
            info.uniform_texel_buffers += report.uniform_texel_buffers;
            info.storage_texel_buffers += report.storage_texel_buffers;
            info.sampled_images += report.sampled_images;
            info.storage_images += report.storage_images;
            info
        });
        info.score = info.uniform_buffers
            + info.storage_buffers
            + info.uniform_texel_buffers
            + info.storage_texel_buffers
            + info.sampled_images
            + info.storage_images;
        info
    }

    /// Total amount of descriptors in this footprint.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Whether every descriptor count of `self` is at least as large as the matching count of `subset`.
    pub fn is_superset(&self, subset: &DescriptorBankInfo) -> bool {
        self.uniform_buffers >= subset.uniform_buffers
            && self.storage_buffers >= subset.storage_buffers
            && self.uniform_texel_buffers >= subset.uniform_texel_buffers
            && self.storage_texel_buffers >= subset.storage_texel_buffers
            && self.sampled_images >= subset.sampled_images
            && self.storage_images >= subset.storage_images
    }

    /// Whether a bank with this footprint may serve requests for `request`. The scores must differ by less than
    /// `threshold`, and this footprint must be a superset of the request.
    pub fn matches(&self, request: &DescriptorBankInfo, threshold: u32) -> bool {
        self.score.abs_diff(request.score) < threshold && self.is_superset(request)
    }

    /// The descriptor counts of this footprint, paired with their descriptor type.
    pub fn descriptor_counts(&self) -> [(vk::DescriptorType, u32); 6] {
        [
            (vk::DescriptorType::UNIFORM_BUFFER, self.uniform_buffers),
            (vk::DescriptorType::STORAGE_BUFFER, self.storage_buffers),
            (vk::DescriptorType::UNIFORM_TEXEL_BUFFER, self.uniform_texel_buffers),
            (vk::DescriptorType::STORAGE_TEXEL_BUFFER, self.storage_texel_buffers),
            (vk::DescriptorType::COMBINED_IMAGE_SAMPLER, self.sampled_images),
            (vk::DescriptorType::STORAGE_IMAGE, self.storage_images),
        ]
    }

    /// The per-pool size table for a pool holding `sets_per_pool` sets of this footprint.
    /// Descriptor types with a zero count are left out, since some drivers reject empty entries.
    pub fn pool_sizes(&self, sets_per_pool: u32) -> Vec<vk::DescriptorPoolSize> {
        self.descriptor_counts()
            .iter()
            .filter(|(_, count)| *count > 0)
            .map(|(ty, count)| vk::DescriptorPoolSize {
                ty: *ty,
                descriptor_count: count * sets_per_pool,
            })
            .collect()
    }
}

impl From<ShaderDescriptorReport> for DescriptorBankInfo {
    fn from(value: ShaderDescriptorReport) -> Self {
        Self::new(&value)
    }
}
