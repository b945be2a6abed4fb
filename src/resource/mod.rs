//! Generic resource containers.
//!
//! - The [`pool`] module provides [`ChunkedPool`](pool::ChunkedPool), a growable list of slots that is filled in chunks.

pub mod pool;
