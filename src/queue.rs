//! Bounded per-edge transport used by the parallel executor.
//!
//! Built on `flume` for in-process fan-out. A queue carries an item's
//! [`Emission`] plus an in-band [`Signal::Poison`] sentinel used for
//! shutdown.

use crate::node::Emission;

#[derive(Debug, Clone)]
pub(crate) enum Signal<T> {
    Emission(Emission<T>),
    Poison,
}

/// One producer -> one consumer bounded FIFO. The sending half is cloned
/// into the producer's out-list (one clone per consumer for fan-out); the
/// receiving half is moved into the consumer's in-list.
pub(crate) struct EdgeQueue<T> {
    pub(crate) tx: flume::Sender<Signal<T>>,
    pub(crate) rx: flume::Receiver<Signal<T>>,
}

impl<T> EdgeQueue<T> {
    pub(crate) fn bounded(capacity: usize) -> Self {
        let (tx, rx) = flume::bounded(capacity);
        Self { tx, rx }
    }
}

/// Default bound for a per-edge queue when the caller does not specify one.
///
/// Small enough to make backpressure observable in tests while still
/// letting a source run ahead of a slow consumer for a little while.
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;
