//! The error taxonomy used throughout the runtime.
//!
//! Each variant corresponds to one of the failure kinds a node or topology
//! can raise; see the module docs of [`crate::topology`] and
//! [`crate::executor`] for where each one is produced.

use thiserror::Error;

/// The graph a user built does not have a valid shape.
///
/// Raised only at topology-build time; no task is ever started once this is
/// returned.
#[derive(Debug, Error)]
pub enum InvalidTopologyError {
    #[error("node `{0}` appears more than once with the same name but is not the same instance")]
    DuplicateName(String),

    #[error("node `{0}` has an unrecognized specialization; expected source, operator or sink")]
    UnknownKind(String),

    #[error(
        "sequential topologies require every non-sink node to have exactly one output; \
         node `{name}` has {count}"
    )]
    TooManyOutputs { name: String, count: usize },

    #[error(
        "sequential topologies require every non-source node to have exactly one input; \
         node `{name}` has {count}"
    )]
    TooManyInputs { name: String, count: usize },

    #[error("operator `{0}` must have at least one input")]
    OperatorWithoutInput(String),

    #[error("operator `{0}` must have at least one output")]
    OperatorWithoutOutput(String),

    #[error("sink `{0}` must have at least one input")]
    SinkWithoutInput(String),

    #[error("source `{0}` must have at least one output")]
    SourceWithoutOutput(String),

    #[error("no sources were supplied")]
    NoSources,

    #[error("unresolved node name `{0}`; nothing registered under it")]
    UnresolvedName(String),
}

/// A node's `open` call failed. Fatal to the run that triggered it.
#[derive(Debug, Error)]
#[error("node `{node}` failed to open: {source}")]
pub struct InitializationError {
    pub node: String,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

/// A node's `close` call failed.
///
/// Logged by the executor; never prevents other nodes' `close` from running.
#[derive(Debug, Error)]
#[error("node `{node}` failed to close: {source}")]
pub struct ShutdownError {
    pub node: String,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

/// Which callback failed when a node raised a [`NodeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeErrorKind {
    Read,
    Apply,
    Write,
}

impl std::fmt::Display for NodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NodeErrorKind::Read => "read",
            NodeErrorKind::Apply => "apply",
            NodeErrorKind::Write => "write",
        };
        f.write_str(s)
    }
}

/// Raised by user node code from `read`, `apply` or `write`.
///
/// Read, apply and write failures are unified into one type tagged by
/// [`NodeErrorKind`], since the executor's handling of all three is
/// identical (log with the offending node name, then abort the run or the
/// one task).
#[derive(Debug, Error)]
#[error("node `{node}` failed during {kind}: {source}")]
pub struct NodeError {
    pub node: String,
    pub kind: NodeErrorKind,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl NodeError {
    pub fn new(
        node: impl Into<String>,
        kind: NodeErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            node: node.into(),
            kind,
            source: Box::new(source),
        }
    }
}

/// Top-level error surfaced by an [`crate::executor`] run.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error(transparent)]
    InvalidTopology(#[from] InvalidTopologyError),

    #[error(transparent)]
    Initialization(#[from] InitializationError),

    #[error(transparent)]
    Node(#[from] NodeError),

    #[error(transparent)]
    Shutdown(#[from] ShutdownError),
}
