//! The node contract: [`Source`], [`Operator`] and [`Sink`] traits, the
//! type-erased [`NodeHandle`] used for graph wiring, and the `connect_*`
//! operations that link two handles together.
//!
//! A topology carries a single payload type `T` shared by every node in it
//! (the wire type) as one Rust generic per [`crate::topology::Topology`]
//! instance — a pipeline over heterogeneous payloads picks a sum type
//! for `T`.

mod handle;
mod traits;

pub use handle::{connect_input, connect_inputs, connect_output, connect_outputs, NodeHandle, NodeRole};
pub use traits::{Node, Operator, Sink, Source};

use indexmap::IndexMap;

/// An emitted value, or the "no value" sentinel.
///
/// A source or operator may emit this instead of an item to signal that,
/// for this particular invocation, nothing should flow downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emission<T> {
    Item(T),
    Absent,
}

impl<T> Emission<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Emission::Absent)
    }

    pub fn item(self) -> Option<T> {
        match self {
            Emission::Item(t) => Some(t),
            Emission::Absent => None,
        }
    }
}

/// What an [`Operator`] or [`Sink`] receives on one iteration.
///
/// A node with a single input receives the raw upstream [`Emission`]. A node
/// with multiple inputs receives one [`Emission`] from *every* upstream,
/// tagged by producer name (the "zip" join).
#[derive(Debug, Clone)]
pub enum Input<T> {
    Single(Emission<T>),
    Zipped(IndexMap<String, Emission<T>>),
}

impl<T> Input<T> {
    /// Convenience used by the sequential executor, which always has a
    /// single upstream (strict chain).
    pub fn single(emission: Emission<T>) -> Self {
        Input::Single(emission)
    }
}

/// The specialization a node fulfills. Used by the topology builder's
/// classification step and by [`NodeHandle`] for dynamic dispatch without
/// downcasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Source,
    Operator,
    Sink,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NodeKind::Source => "source",
            NodeKind::Operator => "operator",
            NodeKind::Sink => "sink",
        };
        f.write_str(s)
    }
}
