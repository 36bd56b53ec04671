use std::sync::{Arc, Mutex};

use dataflow_rt::daemon::ControllerDaemon;
use dataflow_rt::error::{ExecutionError, InvalidTopologyError};
use dataflow_rt::node::{Emission, Input, NodeHandle};
use dataflow_rt::nodes::{FnOperator, FnSink, FnSource};
use dataflow_rt::registry;
use dataflow_rt::{Context, Payload, StopSignal};

fn register_counting_source(name: &str, values: Vec<i64>, stop: Arc<StopSignal>) {
    let mut remaining = values.into_iter();
    let source = NodeHandle::new_source(FnSource::new(
        name,
        Context::new(),
        move |emit: &mut dyn FnMut(Emission<Payload>)| {
            match remaining.next() {
                Some(n) => emit(Emission::Item(Payload::from(n))),
                None => stop.set(),
            }
            Ok(())
        },
    ));
    registry::register_source(name, source);
}

fn register_collecting_sink(name: &str, collected: Arc<Mutex<Vec<i64>>>) {
    let sink = NodeHandle::new_sink(FnSink::new(
        name,
        Context::new(),
        move |input: Input<Payload>| {
            if let Input::Single(Emission::Item(v)) = input {
                if let Some(n) = v.as_i64() {
                    collected.lock().unwrap().push(n);
                }
            }
            Ok(())
        },
    ));
    registry::register_sink(name, sink);
}

#[test]
fn daemon_runs_a_registered_pipeline_to_completion() {
    let stop = StopSignal::new();
    register_counting_source("daemon_test_numbers", vec![1, 2, 3], stop.clone());
    let collected = Arc::new(Mutex::new(Vec::new()));
    register_collecting_sink("daemon_test_collect", collected.clone());

    let doubler = NodeHandle::new_operator(FnOperator::new(
        "daemon_test_doubler",
        Context::new(),
        |input: Input<Payload>, emit: &mut dyn FnMut(Emission<Payload>)| {
            if let Input::Single(Emission::Item(v)) = input {
                if let Some(n) = v.as_i64() {
                    emit(Emission::Item(Payload::from(n * 2)));
                }
            }
            Ok(())
        },
    ));
    registry::register_operator("daemon_test_doubler", doubler);

    let daemon = ControllerDaemon::new(
        "daemon_test_numbers",
        "daemon_test_collect",
        vec!["daemon_test_doubler".to_string()],
    );
    daemon.run(&stop).unwrap();

    assert_eq!(*collected.lock().unwrap(), vec![2, 4, 6]);
}

#[test]
fn daemon_drops_unknown_operator_names_and_keeps_running() {
    let stop = StopSignal::new();
    register_counting_source("daemon_test_unknown_op_numbers", vec![1, 2], stop.clone());
    let collected = Arc::new(Mutex::new(Vec::new()));
    register_collecting_sink("daemon_test_unknown_op_collect", collected.clone());

    let daemon = ControllerDaemon::new(
        "daemon_test_unknown_op_numbers",
        "daemon_test_unknown_op_collect",
        vec!["daemon_test_does_not_exist".to_string()],
    );
    daemon.run(&stop).unwrap();

    assert_eq!(*collected.lock().unwrap(), vec![1, 2]);
}

#[test]
fn daemon_reports_an_unresolvable_name_as_an_invalid_topology_error() {
    let stop = StopSignal::new();

    let err = ControllerDaemon::new(
        "daemon_test_missing_source",
        "daemon_test_missing_sink",
        vec![],
    )
    .run(&stop)
    .unwrap_err();
    assert!(matches!(
        err,
        ExecutionError::InvalidTopology(InvalidTopologyError::UnresolvedName(ref name))
            if name == "daemon_test_missing_source"
    ));

    register_counting_source("daemon_test_present_source", vec![1], stop.clone());
    let err = ControllerDaemon::new(
        "daemon_test_present_source",
        "daemon_test_missing_sink",
        vec![],
    )
    .run(&stop)
    .unwrap_err();
    assert!(matches!(
        err,
        ExecutionError::InvalidTopology(InvalidTopologyError::UnresolvedName(ref name))
            if name == "daemon_test_missing_sink"
    ));
}
