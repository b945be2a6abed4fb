//! A pool of committed slots, filled in fixed-size chunks by a user supplied callback.
//!
//! Slots are handed out in order and never returned. When every slot of the live chunk has been committed, the
//! callback is asked for another chunk. Only the live chunk is kept, slots that were handed out are forgotten.
//!
//! Every commit names an epoch. A chunk only serves commits of the epoch it was materialized in, so when the
//! epoch changes its unused slots are dropped and a fresh chunk is requested.
//!
//! # Example
//! ```
//! # use descriptor_banks::resource::pool::ChunkedPool;
//! # use anyhow::Result;
//! # fn main() -> Result<()> {
//! let mut next = 0;
//! let mut pool = ChunkedPool::new(4, move |count| {
//!     let chunk = (next..next + count).collect();
//!     next += count;
//!     Ok(chunk)
//! });
//! assert_eq!(pool.commit(1)?, 0);
//! assert_eq!(pool.commit(1)?, 1);
//! assert_eq!(pool.remaining(), 2);
//! // A new epoch drops slots 2 and 3.
//! assert_eq!(pool.commit(2)?, 4);
//! # Ok(())
//! # }
//! ```

use anyhow::Result;

use crate::Error;

type BoxedChunkFunc<T> = Box<dyn FnMut(usize) -> Result<Vec<T>> + Send>;

/// Sequence of slots that are materialized in chunks of `grow_rate` items.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct ChunkedPool<T> {
    chunk: Vec<T>,
    cursor: usize,
    epoch: Option<u64>,
    committed: usize,
    grow_rate: usize,
    #[derivative(Debug = "ignore")]
    allocate_fn: BoxedChunkFunc<T>,
}

impl<T: Copy> ChunkedPool<T> {
    /// Create a new, empty pool. `allocate_fn` is called with the chunk size whenever the pool needs more
    /// slots, and must return exactly that many items. A grow rate of zero is treated as one.
    pub fn new(grow_rate: usize, allocate_fn: impl FnMut(usize) -> Result<Vec<T>> + Send + 'static) -> Self {
        Self {
            chunk: Vec::new(),
            cursor: 0,
            epoch: None,
            committed: 0,
            grow_rate: grow_rate.max(1),
            allocate_fn: Box::new(allocate_fn),
        }
    }

    /// Commit the next slot in `epoch`, materializing a new chunk first if the live chunk is used up or
    /// belongs to another epoch.
    /// # Errors
    /// * Fails if the chunk callback fails. Nothing is committed in that case, so the call can be retried.
    /// * Fails if the chunk callback returns the wrong amount of items.
    pub fn commit(&mut self, epoch: u64) -> Result<T> {
        if self.epoch != Some(epoch) {
            self.discard();
            self.epoch = Some(epoch);
        }
        if self.cursor == self.chunk.len() {
            let items = (self.allocate_fn)(self.grow_rate)?;
            if items.len() != self.grow_rate {
                anyhow::bail!(Error::IncompleteAllocation {
                    requested: self.grow_rate,
                    received: items.len(),
                });
            }
            self.chunk = items;
            self.cursor = 0;
        }
        let item = self.chunk[self.cursor];
        self.cursor += 1;
        self.committed += 1;
        Ok(item)
    }

    /// Drop every unused slot of the live chunk.
    pub fn discard(&mut self) {
        self.chunk.clear();
        self.cursor = 0;
    }

    /// Amount of slots committed so far.
    pub fn committed(&self) -> usize {
        self.committed
    }

    /// Amount of slots left in the live chunk.
    pub fn remaining(&self) -> usize {
        self.chunk.len() - self.cursor
    }

    /// Amount of slots per chunk.
    pub fn grow_rate(&self) -> usize {
        self.grow_rate
    }
}
