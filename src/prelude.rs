pub use ash::vk;

pub use crate::core::error::Error;
pub use crate::core::device::{DescriptorDevice, Device};
pub use crate::core::settings::*;

pub use crate::sync::timeline::*;

pub use crate::descriptor::PhysicalPoolStatus;
pub use crate::descriptor::bank_info::*;
pub use crate::descriptor::bank::DescriptorBank;
pub use crate::descriptor::allocator::DescriptorAllocator;
pub use crate::descriptor::registry::DescriptorPoolRegistry;

pub use crate::resource::pool::ChunkedPool;
