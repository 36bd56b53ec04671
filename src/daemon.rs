//! Wires up a sequential pipeline purely from registry names and drives it
//! until stopped.
//!
//! Look up a source, a sink, and a list of operators by name; compose the
//! operators; build a [`crate::topology::SequentialTopology`]; run it with
//! the sequential executor until the shared stop flag fires.
//!
//! An operator name the registry doesn't recognize is logged and dropped
//! rather than treated as a fatal configuration error: a typo in an
//! operator list silently produces a shorter pipeline instead of failing
//! to start.

use std::sync::Arc;

use crate::error::{ExecutionError, InvalidTopologyError};
use crate::executor::SequentialExecutor;
use crate::node::connect_output;
use crate::registry;
use crate::stop::StopSignal;
use crate::topology::build_sequential;

pub struct ControllerDaemon {
    source_name: String,
    sink_name: String,
    operator_names: Vec<String>,
}

impl ControllerDaemon {
    pub fn new(
        source_name: impl Into<String>,
        sink_name: impl Into<String>,
        operator_names: Vec<String>,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            sink_name: sink_name.into(),
            operator_names,
        }
    }

    /// Resolve names, wire the chain, and run it to completion. An
    /// unresolvable source or sink name is a fatal configuration error, not
    /// a skipped no-op: it is logged and returned as
    /// [`InvalidTopologyError::UnresolvedName`] so the caller (the CLI
    /// binary) can exit non-zero instead of reporting a clean run that never
    /// happened.
    pub fn run(&self, stop: &Arc<StopSignal>) -> Result<(), ExecutionError> {
        let Some(source) = registry::get_source(&self.source_name) else {
            log::error!("unknown source `{}`; nothing to run", self.source_name);
            return Err(InvalidTopologyError::UnresolvedName(self.source_name.clone()).into());
        };
        let Some(sink) = registry::get_sink(&self.sink_name) else {
            log::error!("unknown sink `{}`; nothing to run", self.sink_name);
            return Err(InvalidTopologyError::UnresolvedName(self.sink_name.clone()).into());
        };

        let mut operators = Vec::new();
        for name in &self.operator_names {
            match registry::get_operator(name) {
                Some(op) => operators.push(op),
                None => log::warn!("unknown operator `{name}`; dropping it from the pipeline"),
            }
        }

        let mut previous = source.clone();
        for operator in &operators {
            connect_output(&previous, operator);
            previous = operator.clone();
        }
        connect_output(&previous, &sink);

        let topology = build_sequential(&source)?;
        let executor = SequentialExecutor::new(topology);
        executor.execute(stop)
    }
}
