use crate::context::Context;
use crate::error::{InitializationError, NodeError, ShutdownError};
use crate::node::{Emission, Input};

/// Shared by every specialization: a stable name, a [`Context`] handle, and
/// the open/close lifecycle.
///
/// `open`/`close` are called exactly once per execution, in that order, by
/// the executor — never by node code itself.
pub trait Node: Send {
    /// A stable, unique name. Topology construction and the registry key
    /// nodes by this string.
    fn name(&self) -> &str;

    /// Configuration and logger handle for this node.
    fn context(&self) -> &Context;

    /// Acquire any resources needed before the run starts.
    fn open(&mut self) -> Result<(), InitializationError> {
        Ok(())
    }

    /// Release resources after the run ends. Called even if an earlier
    /// node's `close` failed.
    fn close(&mut self) -> Result<(), ShutdownError> {
        Ok(())
    }
}

/// Produces items by repeatedly calling `emit`.
pub trait Source<T>: Node {
    /// Invoke `emit` zero or more times. May be called repeatedly by the
    /// executor until the stop signal is raised.
    fn read(&mut self, emit: &mut dyn FnMut(Emission<T>)) -> Result<(), NodeError>;
}

/// Transforms one item (or a zipped set of items, if fed by more than one
/// producer) into zero or more emitted items.
pub trait Operator<T>: Node {
    fn apply(
        &mut self,
        input: Input<T>,
        emit: &mut dyn FnMut(Emission<T>),
    ) -> Result<(), NodeError>;
}

/// Terminates a chain by consuming an item.
pub trait Sink<T>: Node {
    fn write(&mut self, input: Input<T>) -> Result<(), NodeError>;
}
