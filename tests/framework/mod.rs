#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use ash::prelude::VkResult;
use ash::vk;
use ash::vk::Handle;

use descriptor_banks::{AtomicTimeline, DescriptorDevice, DescriptorPoolRegistry, DescriptorPoolSettings};

#[derive(Debug)]
pub struct MockPool {
    pub sizes: Vec<vk::DescriptorPoolSize>,
    pub max_sets: u32,
    pub allocated: u32,
}

#[derive(Debug, Default)]
pub struct MockState {
    next_handle: u64,
    pub pools: HashMap<vk::DescriptorPool, MockPool>,
    /// Pools in creation order
    pub created: Vec<vk::DescriptorPool>,
    pub resets: Vec<vk::DescriptorPool>,
    pub destroyed: Vec<vk::DescriptorPool>,
    pub allocation_calls: usize,
    /// Pool every set was allocated from
    pub set_pools: HashMap<vk::DescriptorSet, vk::DescriptorPool>,
    /// Results returned by the next allocation calls instead of allocating
    pub forced_results: VecDeque<vk::Result>,
    pub fail_create: Option<vk::Result>,
    pub fail_reset: Option<vk::Result>,
}

/// Software model of a driver. Every pool holds at most `max_sets` sets and reports
/// `VK_ERROR_OUT_OF_POOL_MEMORY` when a request does not fit.
#[derive(Debug)]
pub struct MockDevice {
    sets_per_pool: u32,
    pub state: Mutex<MockState>,
}

impl MockDevice {
    pub fn new(sets_per_pool: u32) -> Self {
        Self {
            sets_per_pool,
            state: Mutex::new(MockState::default()),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    pub fn created_count(&self) -> usize {
        self.with(|state| state.created.len())
    }

    pub fn reset_count(&self) -> usize {
        self.with(|state| state.resets.len())
    }

    pub fn allocation_calls(&self) -> usize {
        self.with(|state| state.allocation_calls)
    }
}

impl MockState {
    fn next_raw(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl DescriptorDevice for MockDevice {
    fn sets_per_pool(&self) -> u32 {
        self.sets_per_pool
    }

    unsafe fn create_descriptor_pool(&self, sizes: &[vk::DescriptorPoolSize], max_sets: u32) -> VkResult<vk::DescriptorPool> {
        self.with(|state| {
            if let Some(result) = state.fail_create {
                return Err(result);
            }
            let handle = vk::DescriptorPool::from_raw(state.next_raw());
            state.pools.insert(
                handle,
                MockPool {
                    sizes: sizes.to_vec(),
                    max_sets,
                    allocated: 0,
                },
            );
            state.created.push(handle);
            Ok(handle)
        })
    }

    unsafe fn allocate_descriptor_sets(
        &self,
        pool: vk::DescriptorPool,
        layouts: &[vk::DescriptorSetLayout],
    ) -> VkResult<Vec<vk::DescriptorSet>> {
        self.with(|state| {
            state.allocation_calls += 1;
            if let Some(result) = state.forced_results.pop_front() {
                return Err(result);
            }
            let count = layouts.len() as u32;
            let mock = state.pools.get(&pool).expect("allocating from unknown pool");
            if mock.allocated + count > mock.max_sets {
                return Err(vk::Result::ERROR_OUT_OF_POOL_MEMORY);
            }
            let sets: Vec<vk::DescriptorSet> = (0..count)
                .map(|_| vk::DescriptorSet::from_raw(state.next_raw()))
                .collect();
            state.pools.get_mut(&pool).unwrap().allocated += count;
            state.set_pools.extend(sets.iter().map(|set| (*set, pool)));
            Ok(sets)
        })
    }

    unsafe fn reset_descriptor_pool(&self, pool: vk::DescriptorPool) -> VkResult<()> {
        self.with(|state| {
            if let Some(result) = state.fail_reset {
                return Err(result);
            }
            state.pools.get_mut(&pool).expect("resetting unknown pool").allocated = 0;
            state.resets.push(pool);
            Ok(())
        })
    }

    unsafe fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool) {
        self.with(|state| {
            state.pools.remove(&pool);
            state.destroyed.push(pool);
        })
    }
}

pub struct Context {
    pub device: Arc<MockDevice>,
    pub timeline: Arc<AtomicTimeline>,
    pub registry: DescriptorPoolRegistry<MockDevice>,
}

/// Creates a registry backed by a mock device for automated tests
pub fn make_context(sets_per_pool: u32) -> Result<Context> {
    make_context_with_settings(DescriptorPoolSettings {
        sets_per_pool,
        ..Default::default()
    })
}

pub fn make_context_with_settings(settings: DescriptorPoolSettings) -> Result<Context> {
    let _ = pretty_env_logger::try_init();
    let device = Arc::new(MockDevice::new(settings.sets_per_pool));
    let timeline = Arc::new(AtomicTimeline::new());
    let registry = DescriptorPoolRegistry::new(device.clone(), timeline.clone(), settings)?;
    Ok(Context {
        device,
        timeline,
        registry,
    })
}

pub fn layout() -> vk::DescriptorSetLayout {
    vk::DescriptorSetLayout::from_raw(0xD5)
}
