//! A dataflow runtime for streaming pipelines: sources, operators and sinks
//! wired into a DAG and executed sequentially on one thread or in parallel
//! with one task per node.
//!
//! Start at [`node::Node`]/[`node::Source`]/[`node::Operator`]/
//! [`node::Sink`] for the traits a pipeline stage implements, [`node::connect_output`]
//! for wiring handles together, and [`topology::build_sequential`]/
//! [`topology::build_parallel`] for turning a wired graph into something an
//! executor can run.

pub mod composition;
pub mod context;
pub mod daemon;
pub mod error;
pub mod executor;
pub mod node;
pub mod nodes;
pub mod queue;
pub mod registry;
pub mod stop;
pub mod topology;

pub use context::Context;
pub use stop::StopSignal;

/// The dynamic payload type the name-driven registry/daemon/CLI path
/// operates over. A pipeline assembled directly in Rust code is not limited
/// to it — any `T: Send` works with [`node::NodeHandle`].
pub type Payload = serde_json::Value;

/// Common imports for building and running a pipeline.
pub mod prelude {
    pub use crate::composition::{compose, compose_list};
    pub use crate::context::Context;
    pub use crate::error::{
        ExecutionError, InitializationError, InvalidTopologyError, NodeError, NodeErrorKind,
        ShutdownError,
    };
    pub use crate::executor::{ParallelExecutor, SequentialExecutor, TaskFactory, ThreadTaskFactory};
    pub use crate::node::{
        connect_input, connect_inputs, connect_output, connect_outputs, Emission, Input, Node,
        NodeHandle, NodeKind, Operator, Sink, Source,
    };
    pub use crate::stop::StopSignal;
    pub use crate::topology::{build_parallel, build_sequential, ParallelTopology, SequentialTopology};
    pub use crate::Payload;
}
