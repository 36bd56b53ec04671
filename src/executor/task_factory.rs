//! The task-spawning injection point.
//!
//! The parallel executor does not care whether a node's task is an OS
//! thread, a scoped thread, or (in principle) something else entirely — it
//! only needs something with `start`/`join`.
//!
//! A true OS-process-per-node factory has no straightforward Rust analogue
//! without an IPC/serialization layer carrying queue items between
//! processes, which is out of scope here (see DESIGN.md). [`ThreadTaskFactory`]
//! is the general-purpose, object-safe implementation of this trait, spawning
//! `'static` named OS threads.
//! [`crate::executor::parallel::ParallelExecutor::execute_scoped`] provides a
//! second mechanism without going through this trait: it spawns every node
//! task inside one `std::thread::scope` block, letting tasks borrow
//! topology-local state instead of requiring `'static` + `Arc` for
//! everything. It is kept as a distinct method rather than a second
//! `dyn TaskFactory` impl because `std::thread::Scope::spawn` requires
//! closures bounded by the scope's lifetime, which this trait's `'static`
//! bound cannot express while remaining object-safe.

use std::thread::JoinHandle;
use std::time::Duration;

/// A started unit of work that can be joined with a bounded timeout.
pub trait TaskHandle {
    /// Wait up to `timeout` for the task to finish. Returns `true` if it
    /// exited in time, `false` if it is still running (the caller abandons
    /// it with a warning).
    fn join(self: Box<Self>, timeout: Duration) -> bool;
}

/// Spawns the task that runs `body` to completion, returning a handle that
/// can be joined later.
pub trait TaskFactory {
    fn spawn(&self, name: String, body: Box<dyn FnOnce() + Send + 'static>) -> Box<dyn TaskHandle>;
}

/// Each node task gets its own named, `'static` OS thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadTaskFactory;

struct ThreadHandle(JoinHandle<()>);

impl TaskHandle for ThreadHandle {
    fn join(self: Box<Self>, timeout: Duration) -> bool {
        join_with_timeout(self.0, timeout)
    }
}

impl TaskFactory for ThreadTaskFactory {
    fn spawn(&self, name: String, body: Box<dyn FnOnce() + Send + 'static>) -> Box<dyn TaskHandle> {
        let handle = std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || body())
            .unwrap_or_else(|e| panic!("failed to spawn task thread `{name}`: {e}"));
        Box::new(ThreadHandle(handle))
    }
}

/// Polls `handle` for completion instead of blocking `join` indefinitely, so
/// a task that never exits is merely abandoned rather than hanging the
/// supervisor.
fn join_with_timeout(handle: JoinHandle<()>, timeout: Duration) -> bool {
    // `JoinHandle::join` has no timeout variant in `std`; approximate one by
    // polling `is_finished` since node tasks are expected to notice the stop
    // flag promptly.
    let start = std::time::Instant::now();
    loop {
        if handle.is_finished() {
            let _ = handle.join();
            return true;
        }
        if start.elapsed() >= timeout {
            return false;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}
