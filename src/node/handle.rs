use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;

use super::{NodeKind, Operator, Sink, Source};
use crate::context::Context;
use crate::error::{InitializationError, ShutdownError};

/// Which specialization a [`NodeHandle`] wraps.
///
/// Kept as an enum rather than a trait object over a single unified trait so
/// that the executor can match on it once per node instead of downcasting a
/// `dyn Any` on every iteration.
pub(crate) enum NodeRole<T> {
    Source(Arc<Mutex<dyn Source<T> + Send>>),
    Operator(Arc<Mutex<dyn Operator<T> + Send>>),
    Sink(Arc<Mutex<dyn Sink<T> + Send>>),
}

impl<T> Clone for NodeRole<T> {
    fn clone(&self) -> Self {
        match self {
            NodeRole::Source(s) => NodeRole::Source(s.clone()),
            NodeRole::Operator(o) => NodeRole::Operator(o.clone()),
            NodeRole::Sink(s) => NodeRole::Sink(s.clone()),
        }
    }
}

/// A type-erased, shared reference to one node in the graph.
///
/// Every `NodeHandle` carries its own `inputs`/`outputs` maps, keyed by peer
/// name in insertion order. Peers are held as [`Weak`]
/// references: the edges a node knows about do not keep its neighbors alive,
/// which is what lets `connect_output`/`connect_input` wire up two nodes
/// that reference each other without forming an `Arc` retain cycle. The
/// owner of the strong `Arc`s is whoever constructed the nodes (typically a
/// `Vec` the caller holds during graph-building) and, once a topology is
/// derived, the [`crate::topology::Topology`] itself.
pub struct NodeHandle<T> {
    name: String,
    kind: NodeKind,
    role: NodeRole<T>,
    context: Context,
    inputs: Mutex<IndexMap<String, Weak<NodeHandle<T>>>>,
    outputs: Mutex<IndexMap<String, Weak<NodeHandle<T>>>>,
}

impl<T> NodeHandle<T> {
    fn new(name: String, kind: NodeKind, role: NodeRole<T>, context: Context) -> Arc<Self> {
        Arc::new(Self {
            name,
            kind,
            role,
            context,
            inputs: Mutex::new(IndexMap::new()),
            outputs: Mutex::new(IndexMap::new()),
        })
    }

    pub fn new_source(source: impl Source<T> + Send + 'static) -> Arc<Self> {
        let name = source.name().to_string();
        let context = source.context().clone();
        Self::new(
            name,
            NodeKind::Source,
            NodeRole::Source(Arc::new(Mutex::new(source))),
            context,
        )
    }

    pub fn new_operator(operator: impl Operator<T> + Send + 'static) -> Arc<Self> {
        let name = operator.name().to_string();
        let context = operator.context().clone();
        Self::new(
            name,
            NodeKind::Operator,
            NodeRole::Operator(Arc::new(Mutex::new(operator))),
            context,
        )
    }

    pub fn new_sink(sink: impl Sink<T> + Send + 'static) -> Arc<Self> {
        let name = sink.name().to_string();
        let context = sink.context().clone();
        Self::new(
            name,
            NodeKind::Sink,
            NodeRole::Sink(Arc::new(Mutex::new(sink))),
            context,
        )
    }

    /// Wrap an already-composed operator role directly, used by
    /// [`crate::composition`] to fold a chain into one virtual handle
    /// without re-deriving a name from a concrete struct.
    pub(crate) fn from_operator_role(
        name: String,
        context: Context,
        role: Arc<Mutex<dyn Operator<T> + Send>>,
    ) -> Arc<Self> {
        Self::new(name, NodeKind::Operator, NodeRole::Operator(role), context)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub(crate) fn role(&self) -> &NodeRole<T> {
        &self.role
    }

    pub(crate) fn as_source(&self) -> Option<Arc<Mutex<dyn Source<T> + Send>>> {
        match &self.role {
            NodeRole::Source(s) => Some(s.clone()),
            _ => None,
        }
    }

    pub(crate) fn as_operator(&self) -> Option<Arc<Mutex<dyn Operator<T> + Send>>> {
        match &self.role {
            NodeRole::Operator(o) => Some(o.clone()),
            _ => None,
        }
    }

    pub(crate) fn as_sink(&self) -> Option<Arc<Mutex<dyn Sink<T> + Send>>> {
        match &self.role {
            NodeRole::Sink(s) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn open(&self) -> Result<(), InitializationError> {
        let result = match &self.role {
            NodeRole::Source(s) => s.lock().open(),
            NodeRole::Operator(o) => o.lock().open(),
            NodeRole::Sink(s) => s.lock().open(),
        };
        result.map_err(|mut e| {
            e.node = self.name.clone();
            e
        })
    }

    pub fn close(&self) -> Result<(), ShutdownError> {
        let result = match &self.role {
            NodeRole::Source(s) => s.lock().close(),
            NodeRole::Operator(o) => o.lock().close(),
            NodeRole::Sink(s) => s.lock().close(),
        };
        result.map_err(|mut e| {
            e.node = self.name.clone();
            e
        })
    }

    /// Names of the nodes feeding this one, in connection order.
    pub fn input_names(&self) -> Vec<String> {
        self.inputs.lock().keys().cloned().collect()
    }

    /// Names of the nodes this one feeds, in connection order.
    pub fn output_names(&self) -> Vec<String> {
        self.outputs.lock().keys().cloned().collect()
    }

    /// Upgrade every output edge to a strong reference, dropping (and
    /// logging) any peer that was already collected.
    pub(crate) fn live_outputs(&self) -> Vec<(String, Arc<NodeHandle<T>>)> {
        self.outputs
            .lock()
            .iter()
            .filter_map(|(name, weak)| {
                weak.upgrade().map(|n| (name.clone(), n)).or_else(|| {
                    log::warn!(
                        "node `{}` has a dangling reference to former output `{name}`",
                        self.name
                    );
                    None
                })
            })
            .collect()
    }

    pub(crate) fn live_inputs(&self) -> Vec<(String, Arc<NodeHandle<T>>)> {
        self.inputs
            .lock()
            .iter()
            .filter_map(|(name, weak)| weak.upgrade().map(|n| (name.clone(), n)))
            .collect()
    }
}

/// Register `other` as a consumer of `self`'s output.
///
/// Effect: `self.outputs[other.name] = other` and
/// `other.inputs[self.name] = self`. Re-adding the same peer is idempotent.
/// Not safe to call concurrently with another connect touching either
/// endpoint; graph wiring is expected to complete before execution begins.
pub fn connect_output<T>(from: &Arc<NodeHandle<T>>, to: &Arc<NodeHandle<T>>) {
    from.outputs
        .lock()
        .entry(to.name.clone())
        .or_insert_with(|| Arc::downgrade(to));
    to.inputs
        .lock()
        .entry(from.name.clone())
        .or_insert_with(|| Arc::downgrade(from));
}

/// The symmetric counterpart of [`connect_output`]: register `self` as a
/// consumer of `other`.
pub fn connect_input<T>(to: &Arc<NodeHandle<T>>, from: &Arc<NodeHandle<T>>) {
    connect_output(from, to);
}

/// [`connect_output`] applied to every element of `to`, in order.
pub fn connect_outputs<T>(from: &Arc<NodeHandle<T>>, to: &[Arc<NodeHandle<T>>]) {
    for peer in to {
        connect_output(from, peer);
    }
}

/// [`connect_input`] applied to every element of `from`, in order.
pub fn connect_inputs<T>(to: &Arc<NodeHandle<T>>, from: &[Arc<NodeHandle<T>>]) {
    for peer in from {
        connect_input(to, peer);
    }
}
