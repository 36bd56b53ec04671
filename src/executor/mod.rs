//! Running a derived topology to completion.
//!
//! [`SequentialExecutor`] drives a [`crate::topology::SequentialTopology`]
//! on the calling thread. [`ParallelExecutor`] drives a
//! [`crate::topology::ParallelTopology`] with one task per node, wired
//! through bounded per-edge queues.

mod parallel;
mod sequential;
mod task_factory;

pub use parallel::ParallelExecutor;
pub use sequential::SequentialExecutor;
pub use task_factory::{TaskFactory, TaskHandle, ThreadTaskFactory};
