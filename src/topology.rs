//! Deriving a runnable topology from a user-built graph.
//!
//! Two topology shapes exist, mirroring the two execution strategies, rather
//! than one generic graph type:
//!
//! - [`SequentialTopology`] is a single strict chain: one source, one
//!   (possibly composed) operator, one sink.
//! - [`ParallelTopology`] is the general graph: a list of sources, a list of
//!   operators in topological (BFS visit) order, and a list of sinks. Queues
//!   are *not* stored here — they are materialized per-run by
//!   [`crate::executor::parallel::ParallelExecutor`].

use std::sync::Arc;

use indexmap::IndexMap;

use crate::composition::compose_list;
use crate::error::InvalidTopologyError;
use crate::node::{NodeHandle, NodeKind};

/// A validated strict chain: `source -> operator -> sink`, with `operator`
/// already folded (via [`compose_list`]) from every operator visited along
/// the chain, or `None` if the source feeds the sink directly.
pub struct SequentialTopology<T> {
    pub source: Arc<NodeHandle<T>>,
    pub operator: Option<Arc<NodeHandle<T>>>,
    pub sink: Arc<NodeHandle<T>>,
}

/// The general graph: every reachable source, operator and sink, deduplicated
/// by name and with operators kept in BFS visit order so a caller can still
/// fold them if it wants a single combined operator.
pub struct ParallelTopology<T> {
    pub sources: Vec<Arc<NodeHandle<T>>>,
    pub operators: Vec<Arc<NodeHandle<T>>>,
    pub sinks: Vec<Arc<NodeHandle<T>>>,
}

impl<T> ParallelTopology<T> {
    /// Every node in the graph, sources first, then operators, then sinks.
    pub fn nodes(&self) -> impl Iterator<Item = &Arc<NodeHandle<T>>> {
        self.sources
            .iter()
            .chain(self.operators.iter())
            .chain(self.sinks.iter())
    }
}

/// Build a [`SequentialTopology`] by walking a single strict chain from
/// `source`.
///
/// Fails with [`InvalidTopologyError::TooManyOutputs`] as soon as a
/// non-sink node has more than one output, or
/// [`InvalidTopologyError::TooManyInputs`] once the chain reaches a node
/// with more than one input — a sequential topology has no room for fan-out
/// or fan-in.
pub fn build_sequential<T>(
    source: &Arc<NodeHandle<T>>,
) -> Result<SequentialTopology<T>, InvalidTopologyError> {
    let mut operators = Vec::new();
    let mut current = source.clone();

    loop {
        let outputs = current.live_outputs();
        if outputs.is_empty() {
            return Err(InvalidTopologyError::SourceWithoutOutput(
                current.name().to_string(),
            ));
        }
        if outputs.len() != 1 {
            return Err(InvalidTopologyError::TooManyOutputs {
                name: current.name().to_string(),
                count: outputs.len(),
            });
        }
        let (_, next) = outputs.into_iter().next().unwrap();
        let inputs = next.live_inputs();
        if inputs.len() != 1 {
            return Err(InvalidTopologyError::TooManyInputs {
                name: next.name().to_string(),
                count: inputs.len(),
            });
        }
        match next.kind() {
            NodeKind::Operator => {
                operators.push(next.clone());
                current = next;
            }
            NodeKind::Sink => {
                let operator = if operators.is_empty() {
                    None
                } else {
                    Some(compose_list(operators))
                };
                return Ok(SequentialTopology {
                    source: source.clone(),
                    operator,
                    sink: next,
                });
            }
            NodeKind::Source => {
                return Err(InvalidTopologyError::UnknownKind(next.name().to_string()));
            }
        }
    }
}

/// Build a [`ParallelTopology`] by a breadth-first walk starting from every
/// entry in `sources`. A node is enqueued only the first time it is reached,
/// even when multiple upstream paths lead to it.
///
/// Warns (does not fail) if two distinct source instances in `sources` share
/// a name. Fails with [`InvalidTopologyError::OperatorWithoutInput`] /
/// [`OperatorWithoutOutput`] / [`SinkWithoutInput`] / [`SourceWithoutOutput`]
/// if the corresponding arity invariant is violated.
pub fn build_parallel<T>(
    sources: &[Arc<NodeHandle<T>>],
) -> Result<ParallelTopology<T>, InvalidTopologyError> {
    if sources.is_empty() {
        return Err(InvalidTopologyError::NoSources);
    }
    warn_duplicate_names(sources);

    let mut operators: IndexMap<String, Arc<NodeHandle<T>>> = IndexMap::new();
    let mut sinks: IndexMap<String, Arc<NodeHandle<T>>> = IndexMap::new();
    let mut visited: IndexMap<String, ()> = IndexMap::new();
    let mut queue: std::collections::VecDeque<Arc<NodeHandle<T>>> = std::collections::VecDeque::new();

    for source in sources {
        if source.live_outputs().is_empty() {
            return Err(InvalidTopologyError::SourceWithoutOutput(
                source.name().to_string(),
            ));
        }
        if visited.insert(source.name().to_string(), ()).is_none() {
            queue.push_back(source.clone());
        }
    }

    while let Some(node) = queue.pop_front() {
        match node.kind() {
            NodeKind::Source => {
                for (_, out) in node.live_outputs() {
                    if visited.insert(out.name().to_string(), ()).is_none() {
                        queue.push_back(out);
                    }
                }
            }
            NodeKind::Operator => {
                if node.live_inputs().is_empty() {
                    return Err(InvalidTopologyError::OperatorWithoutInput(
                        node.name().to_string(),
                    ));
                }
                let out_edges = node.live_outputs();
                if out_edges.is_empty() {
                    return Err(InvalidTopologyError::OperatorWithoutOutput(
                        node.name().to_string(),
                    ));
                }
                operators.insert(node.name().to_string(), node.clone());
                for (_, out) in out_edges {
                    if visited.insert(out.name().to_string(), ()).is_none() {
                        queue.push_back(out);
                    }
                }
            }
            NodeKind::Sink => {
                if node.live_inputs().is_empty() {
                    return Err(InvalidTopologyError::SinkWithoutInput(
                        node.name().to_string(),
                    ));
                }
                sinks.insert(node.name().to_string(), node.clone());
            }
        }
    }

    Ok(ParallelTopology {
        sources: sources.to_vec(),
        operators: operators.into_values().collect(),
        sinks: sinks.into_values().collect(),
    })
}

fn warn_duplicate_names<T>(nodes: &[Arc<NodeHandle<T>>]) {
    let mut seen: IndexMap<&str, &Arc<NodeHandle<T>>> = IndexMap::new();
    for node in nodes {
        if let Some(existing) = seen.get(node.name()) {
            if !Arc::ptr_eq(existing, node) {
                log::warn!(
                    "topology was initialized twice with the same name \"{}\"; \
                     nodes must have unique names, check for a duplicate",
                    node.name()
                );
            }
        } else {
            seen.insert(node.name(), node);
        }
    }
}
