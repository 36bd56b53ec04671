//! The shared, one-shot stop signal observed by every executor and task.
//!
//! A condvar-backed boolean flag that both the sequential and parallel
//! executors take as a constructor argument.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

#[derive(Default)]
pub struct StopSignal {
    set: Mutex<bool>,
    condvar: Condvar,
}

impl StopSignal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Raise the signal. Idempotent.
    pub fn set(&self) {
        let mut guard = self.set.lock();
        if !*guard {
            *guard = true;
            self.condvar.notify_all();
        }
    }

    pub fn is_set(&self) -> bool {
        *self.set.lock()
    }

    /// Block until the signal is raised. Used by the parallel supervisor,
    /// which has nothing else to do until a stop is requested.
    pub fn wait(&self) {
        let mut guard = self.set.lock();
        while !*guard {
            self.condvar.wait(&mut guard);
        }
    }
}
