//! The single-threaded executor: `Idle -> Opening -> Running -> Closing ->
//! Idle`.
//!
//! One `source.read` call, zero or more operator applications, zero or more
//! sink writes, strictly in that order with no concurrency.

use parking_lot::Mutex;

use crate::error::{ExecutionError, ShutdownError};
use crate::node::Input;
use crate::stop::StopSignal;
use crate::topology::SequentialTopology;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Opening,
    Running,
    Closing,
}

/// Runs a [`SequentialTopology`] to completion.
///
/// `execute` may be called again once a previous run has returned to
/// `Idle` — transitions are one-way within a single run, not across runs.
pub struct SequentialExecutor<T> {
    topology: SequentialTopology<T>,
    /// Controls whether an absent emission short-circuits the chain
    /// (`true`) or is passed through to the next stage, which must then
    /// cope with it itself (`false`, the default — matching the original
    /// `SynchronousEnvironment`'s own `skip_none=False` default).
    pub skip_absent: bool,
    state: Mutex<State>,
}

impl<T> SequentialExecutor<T> {
    pub fn new(topology: SequentialTopology<T>) -> Self {
        Self {
            topology,
            skip_absent: false,
            state: Mutex::new(State::Idle),
        }
    }

    pub fn with_skip_absent(mut self, skip_absent: bool) -> Self {
        self.skip_absent = skip_absent;
        self
    }

    pub fn execute(&self, stop: &StopSignal) -> Result<(), ExecutionError> {
        *self.state.lock() = State::Opening;
        self.topology.source.open()?;
        if let Some(op) = &self.topology.operator {
            op.open()?;
        }
        self.topology.sink.open()?;

        *self.state.lock() = State::Running;
        let run_result = self.run_loop(stop);

        *self.state.lock() = State::Closing;
        let close_result = self.close_all();
        *self.state.lock() = State::Idle;

        run_result?;
        close_result?;
        Ok(())
    }

    fn run_loop(&self, stop: &StopSignal) -> Result<(), ExecutionError> {
        let source = self
            .topology
            .source
            .as_source()
            .expect("sequential topology source handle must wrap a Source");
        let operator = self.topology.operator.as_ref().map(|h| {
            h.as_operator()
                .expect("sequential topology operator handle must wrap an Operator")
        });
        let sink = self
            .topology
            .sink
            .as_sink()
            .expect("sequential topology sink handle must wrap a Sink");

        while !stop.is_set() {
            let mut produced = Vec::new();
            source.lock().read(&mut |e| produced.push(e))?;

            for src_item in produced {
                if self.skip_absent && src_item.is_absent() {
                    continue;
                }
                let mut op_out = Vec::new();
                match &operator {
                    Some(op) => op.lock().apply(Input::single(src_item), &mut |e| op_out.push(e))?,
                    None => op_out.push(src_item),
                }
                for out_item in op_out {
                    if self.skip_absent && out_item.is_absent() {
                        continue;
                    }
                    sink.lock().write(Input::single(out_item))?;
                }
            }
        }
        Ok(())
    }

    fn close_all(&self) -> Result<(), ShutdownError> {
        let source_result = self.topology.source.close();
        let operator_result = match &self.topology.operator {
            Some(op) => op.close(),
            None => Ok(()),
        };
        let sink_result = self.topology.sink.close();
        source_result.and(operator_result).and(sink_result)
    }
}
