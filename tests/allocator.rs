use std::collections::HashSet;

use anyhow::Result;
use ash::vk;

use descriptor_banks::{ChunkedPool, DescriptorAllocator, DescriptorPoolSettings, Error, ShaderDescriptorReport, SubmissionTracker};

mod framework;

use framework::{Context, MockDevice};

fn report() -> ShaderDescriptorReport {
    ShaderDescriptorReport {
        storage_buffers: 2,
        storage_images: 1,
        ..Default::default()
    }
}

fn context_with_grow_rate(grow_rate: usize) -> Result<Context> {
    framework::make_context_with_settings(DescriptorPoolSettings {
        sets_per_pool: 64,
        grow_rate,
        ..Default::default()
    })
}

/// Remembers the tick every set was committed in, and checks on every commit that no pool was reset while a set
/// allocated from it may still be used by a pending submission.
#[derive(Default)]
struct CommitLog {
    sets: Vec<(vk::DescriptorSet, u64)>,
    resets_seen: usize,
}

impl CommitLog {
    fn commit(&mut self, context: &Context, allocator: &mut DescriptorAllocator<MockDevice>) -> Result<vk::DescriptorSet> {
        let tick = context.timeline.current_tick();
        let completed = context.timeline.last_completed();
        let set = allocator.commit()?;
        context.device.with(|state| {
            for pool in &state.resets[self.resets_seen..] {
                for (old, old_tick) in &self.sets {
                    if state.set_pools[old] == *pool {
                        assert!(
                            *old_tick <= completed,
                            "{pool:?} was reset while {old:?} from tick {old_tick} is pending (completed: {completed})"
                        );
                    }
                }
            }
            self.resets_seen = state.resets.len();
        });
        self.sets.push((set, tick));
        Ok(set)
    }
}

#[test]
pub fn chunked_pool_grows_in_chunks() -> Result<()> {
    let mut calls = Vec::new();
    let (sender, receiver) = std::sync::mpsc::channel();
    let mut next = 0u32;
    let mut pool = ChunkedPool::new(3, move |count| {
        sender.send(count)?;
        let chunk = (next..next + count as u32).collect();
        next += count as u32;
        Ok(chunk)
    });

    for expected in 0..7 {
        assert_eq!(pool.commit(1)?, expected);
    }
    calls.extend(receiver.try_iter());
    assert_eq!(calls, vec![3, 3, 3]);
    assert_eq!(pool.committed(), 7);
    assert_eq!(pool.remaining(), 2);
    Ok(())
}

#[test]
pub fn chunked_pool_drops_slots_of_old_epochs() -> Result<()> {
    let mut next = 0u32;
    let mut pool = ChunkedPool::new(4, move |count| {
        let chunk = (next..next + count as u32).collect();
        next += count as u32;
        Ok(chunk)
    });

    assert_eq!(pool.commit(1)?, 0);
    assert_eq!(pool.commit(1)?, 1);
    assert_eq!(pool.commit(2)?, 4, "Slots 2 and 3 belong to the previous epoch");
    assert_eq!(pool.remaining(), 3);
    assert_eq!(pool.commit(2)?, 5);
    pool.discard();
    assert_eq!(pool.remaining(), 0);
    assert_eq!(pool.commit(2)?, 8);
    assert_eq!(pool.committed(), 5);
    Ok(())
}

#[test]
pub fn chunked_pool_only_holds_the_live_chunk() -> Result<()> {
    let mut pool = ChunkedPool::new(8, |count| Ok(vec![0u64; count]));
    for epoch in 0..256 {
        for _ in 0..20 {
            pool.commit(epoch)?;
            assert!(pool.remaining() < 8);
        }
    }
    assert_eq!(pool.committed(), 256 * 20);
    Ok(())
}

#[test]
pub fn chunked_pool_rejects_short_chunks() {
    let mut pool = ChunkedPool::new(4, |count| Ok(vec![0u8; count - 1]));
    let err = pool.commit(1).expect_err("Short chunks must be rejected");
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::IncompleteAllocation {
            requested: 4,
            received: 3
        })
    ));
    assert_eq!(pool.committed(), 0);
    assert_eq!(pool.remaining(), 0);
}

#[test]
pub fn chunked_pool_zero_grow_rate() -> Result<()> {
    let mut pool = ChunkedPool::new(0, |count| Ok(vec![1u8; count]));
    assert_eq!(pool.grow_rate(), 1);
    pool.commit(1)?;
    assert_eq!(pool.remaining(), 0);
    pool.commit(1)?;
    assert_eq!(pool.remaining(), 0);
    Ok(())
}

#[test]
pub fn allocator_commits_from_chunks() -> Result<()> {
    let context = context_with_grow_rate(4)?;
    let mut allocator = context.registry.allocator_for_shader(framework::layout(), &report())?;
    assert_eq!(context.device.allocation_calls(), 0, "Sets are only allocated on first use");

    let sets = (0..5).map(|_| allocator.commit()).collect::<Result<Vec<vk::DescriptorSet>>>()?;
    assert_eq!(context.device.allocation_calls(), 2);
    assert_eq!(allocator.committed(), 5);
    assert_eq!(sets.iter().collect::<HashSet<_>>().len(), 5);
    assert_eq!(allocator.remaining(), 3);
    Ok(())
}

#[test]
pub fn default_grow_rate_is_sixteen() -> Result<()> {
    let context = framework::make_context(64)?;
    let mut allocator = context.registry.allocator_for_shader(framework::layout(), &report())?;
    for _ in 0..17 {
        allocator.commit()?;
    }
    assert_eq!(context.device.allocation_calls(), 2);
    let bank = allocator.bank();
    context.device.with(|state| {
        let pool = &state.pools[&bank.pool_status().unwrap()[0].handle];
        assert_eq!(pool.allocated, 32);
    });
    Ok(())
}

#[test]
pub fn allocators_share_a_bank() -> Result<()> {
    let context = context_with_grow_rate(8)?;
    let mut first = context.registry.allocator_for_shader(framework::layout(), &report())?;
    let mut second = context.registry.allocator_for_shader(framework::layout(), &report())?;
    assert!(std::sync::Arc::ptr_eq(first.bank(), second.bank()));

    let a = first.commit()?;
    let b = second.commit()?;
    assert_ne!(a, b);
    assert_eq!(first.bank().pool_count()?, 1);
    context.device.with(|state| {
        let pool = &state.pools[&state.created[0]];
        assert_eq!(pool.allocated, 16);
    });
    Ok(())
}

#[test]
pub fn failed_commit_can_be_retried() -> Result<()> {
    let context = context_with_grow_rate(4)?;
    let mut allocator = context.registry.allocator_for_shader(framework::layout(), &report())?;
    context
        .device
        .with(|state| state.forced_results.push_back(vk::Result::ERROR_OUT_OF_HOST_MEMORY));

    let err = allocator.commit().expect_err("The first chunk allocation fails");
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::AllocationFailed(_))));
    assert_eq!(allocator.committed(), 0);

    allocator.commit()?;
    assert_eq!(allocator.committed(), 1);
    Ok(())
}

#[test]
pub fn allocator_drops_chunk_on_new_tick() -> Result<()> {
    let context = context_with_grow_rate(4)?;
    let mut allocator = context.registry.allocator_for_shader(framework::layout(), &report())?;
    let first = allocator.commit()?;
    assert_eq!(allocator.remaining(), 3);

    context.timeline.next_tick();
    let second = allocator.commit()?;
    assert_eq!(context.device.allocation_calls(), 2, "The rest of the old chunk is not used in the new tick");
    assert_eq!(allocator.remaining(), 3);
    assert_eq!(allocator.committed(), 2);
    let status = allocator.bank().pool_status()?;
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].last_submission_id, context.timeline.current_tick());
    context.device.with(|state| {
        assert_eq!(state.set_pools[&first], state.set_pools[&second]);
        assert_eq!(state.pools[&state.created[0]].allocated, 8);
    });
    Ok(())
}

#[test]
pub fn pending_sets_keep_their_pool_alive() -> Result<()> {
    let context = framework::make_context_with_settings(DescriptorPoolSettings {
        sets_per_pool: 32,
        grow_rate: 16,
        ..Default::default()
    })?;
    let mut first = context.registry.allocator_for_shader(framework::layout(), &report())?;
    let mut second = context.registry.allocator_for_shader(framework::layout(), &report())?;
    let mut log = CommitLog::default();

    // Tick 1 fills the first pool with one chunk per allocator.
    log.commit(&context, &mut first)?;
    log.commit(&context, &mut second)?;
    context.timeline.next_tick();

    // Tick 2 is recorded while tick 1 completes. The set committed now must not come from a pool that can be
    // recycled as soon as tick 1 is done.
    let pending = log.commit(&context, &mut first)?;
    context.timeline.signal_completed(1);
    for _ in 0..16 {
        log.commit(&context, &mut second)?;
    }
    for _ in 0..16 {
        log.commit(&context, &mut first)?;
    }

    context.device.with(|state| {
        assert_ne!(state.set_pools[&pending], state.created[0]);
        assert_eq!(state.resets, vec![state.created[0]]);
    });
    assert_eq!(first.bank().pool_count()?, 2);
    Ok(())
}

#[test]
pub fn allocator_survives_many_frames() -> Result<()> {
    let context = context_with_grow_rate(16)?;
    let mut allocator = context.registry.allocator_for_shader(framework::layout(), &report())?;
    let mut log = CommitLog::default();
    let mut pools = allocator.bank().pool_count()?;
    for frame in 0..64 {
        for _ in 0..40 {
            log.commit(&context, &mut allocator)?;
            assert!(allocator.remaining() < 16);
        }
        let count = allocator.bank().pool_count()?;
        assert!(count >= pools, "Pools are never removed from a bank");
        pools = count;
        // Every other frame the GPU falls behind by one submission.
        let tick = context.timeline.next_tick();
        context.timeline.signal_completed(if frame % 2 == 0 { tick.saturating_sub(1) } else { tick });
    }
    assert!(context.device.reset_count() > 0, "Completed pools are recycled");
    assert_eq!(context.device.created_count(), pools);
    Ok(())
}
