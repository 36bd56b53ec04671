//! Process-wide name -> node registry, used by [`crate::daemon`] and the CLI
//! binary to assemble a topology purely from names in a config file.
//!
//! One `Mutex<IndexMap<..>>` per kind (source/operator/sink) behind a
//! `once_cell::sync::Lazy` static.
//!
//! The registry operates over one concrete payload type,
//! [`crate::Payload`] (a `serde_json::Value`), since name-driven assembly
//! from a config file is inherently dynamically typed. Code building a
//! topology directly in Rust is not limited to this type; see
//! [`crate::node::NodeHandle`].

use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::nodes::{LogOperator, NoopSink};
use crate::node::NodeHandle;
use crate::Payload;

type SourceMap = Mutex<IndexMap<String, Arc<NodeHandle<Payload>>>>;
type OperatorMap = Mutex<IndexMap<String, Arc<NodeHandle<Payload>>>>;
type SinkMap = Mutex<IndexMap<String, Arc<NodeHandle<Payload>>>>;

static SOURCES: Lazy<SourceMap> = Lazy::new(|| Mutex::new(IndexMap::new()));
static OPERATORS: Lazy<OperatorMap> = Lazy::new(|| Mutex::new(IndexMap::new()));
static SINKS: Lazy<SinkMap> = Lazy::new(|| Mutex::new(IndexMap::new()));

/// Register a source under `name`, replacing any previous registration.
pub fn register_source(name: impl Into<String>, handle: Arc<NodeHandle<Payload>>) {
    SOURCES.lock().insert(name.into(), handle);
}

pub fn register_operator(name: impl Into<String>, handle: Arc<NodeHandle<Payload>>) {
    OPERATORS.lock().insert(name.into(), handle);
}

pub fn register_sink(name: impl Into<String>, handle: Arc<NodeHandle<Payload>>) {
    SINKS.lock().insert(name.into(), handle);
}

pub fn get_source(name: &str) -> Option<Arc<NodeHandle<Payload>>> {
    SOURCES.lock().get(name).cloned()
}

pub fn get_operator(name: &str) -> Option<Arc<NodeHandle<Payload>>> {
    OPERATORS.lock().get(name).cloned()
}

pub fn get_sink(name: &str) -> Option<Arc<NodeHandle<Payload>>> {
    SINKS.lock().get(name).cloned()
}

/// Register the built-in nodes every fresh process should have available,
/// without clobbering anything a caller already registered under the same
/// name. Safe to call more than once: the registered instance count per
/// name is always one.
pub fn init_defaults() {
    let mut sinks = SINKS.lock();
    sinks
        .entry("noop".to_string())
        .or_insert_with(|| NodeHandle::new_sink(NoopSink::new("noop", crate::Context::new())));
    drop(sinks);

    let mut operators = OPERATORS.lock();
    operators
        .entry("log".to_string())
        .or_insert_with(|| NodeHandle::new_operator(LogOperator::new("log", crate::Context::new())));
}
