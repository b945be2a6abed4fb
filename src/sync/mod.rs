//! The sync module provides the submission tracking descriptor banks rely on.
//!
//! - The [`timeline`] module defines the [`SubmissionTracker`](crate::SubmissionTracker) trait, a host-side
//! implementation of it, and one based on Vulkan timeline semaphores.

pub mod timeline;
