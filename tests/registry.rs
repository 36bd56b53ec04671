use std::sync::Arc;

use dataflow_rt::node::NodeHandle;
use dataflow_rt::registry;

#[test]
fn init_defaults_registers_noop_sink_and_log_operator_once() {
    registry::init_defaults();
    let sink_first = registry::get_sink("noop").expect("noop sink registered");
    let operator_first = registry::get_operator("log").expect("log operator registered");

    // Calling it again must not replace an already-registered entry.
    registry::init_defaults();
    let sink_second = registry::get_sink("noop").expect("noop sink still registered");
    let operator_second = registry::get_operator("log").expect("log operator still registered");

    assert!(Arc::ptr_eq(&sink_first, &sink_second));
    assert!(Arc::ptr_eq(&operator_first, &operator_second));
}

#[test]
fn caller_registered_nodes_survive_init_defaults() {
    let custom_sink: Arc<NodeHandle<serde_json::Value>> =
        NodeHandle::new_sink(dataflow_rt::nodes::NoopSink::new(
            "custom",
            dataflow_rt::Context::new(),
        ));
    registry::register_sink("custom", custom_sink.clone());
    registry::init_defaults();

    let resolved = registry::get_sink("custom").expect("custom sink still registered");
    assert!(Arc::ptr_eq(&custom_sink, &resolved));
}
