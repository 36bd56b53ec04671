use std::sync::Arc;

use dataflow_rt::error::InvalidTopologyError;
use dataflow_rt::node::{connect_output, Emission, Input};
use dataflow_rt::nodes::{FnOperator, FnSink, FnSource};
use dataflow_rt::prelude::*;

fn no_op_source(name: &str) -> Arc<NodeHandle<i32>> {
    NodeHandle::new_source(FnSource::new(name, Context::new(), |_: &mut dyn FnMut(Emission<i32>)| Ok(())))
}

fn pass_through_operator(name: &str) -> Arc<NodeHandle<i32>> {
    NodeHandle::new_operator(FnOperator::new(
        name,
        Context::new(),
        |input: Input<i32>, emit: &mut dyn FnMut(Emission<i32>)| {
            if let Input::Single(e) = input {
                emit(e);
            }
            Ok(())
        },
    ))
}

fn discard_sink(name: &str) -> Arc<NodeHandle<i32>> {
    NodeHandle::new_sink(FnSink::new(name, Context::new(), |_: Input<i32>| Ok(())))
}

#[test]
fn sequential_rejects_fan_out() {
    let source = no_op_source("source");
    let sink_a = discard_sink("sink_a");
    let sink_b = discard_sink("sink_b");
    connect_output(&source, &sink_a);
    connect_output(&source, &sink_b);

    let err = build_sequential(&source).unwrap_err();
    assert!(matches!(err, InvalidTopologyError::TooManyOutputs { .. }));
}

#[test]
fn sequential_rejects_fan_in() {
    let source_a = no_op_source("source_a");
    let source_b = no_op_source("source_b");
    let sink = discard_sink("sink");
    connect_output(&source_a, &sink);
    connect_output(&source_b, &sink);

    let err = build_sequential(&source_a).unwrap_err();
    assert!(matches!(err, InvalidTopologyError::TooManyInputs { .. }));
}

#[test]
fn sequential_without_operator_wires_source_directly_to_sink() {
    let source = no_op_source("source");
    let sink = discard_sink("sink");
    connect_output(&source, &sink);

    let topology = build_sequential(&source).unwrap();
    assert!(topology.operator.is_none());
    assert_eq!(topology.sink.name(), "sink");
}

#[test]
fn sequential_fails_when_source_has_no_output() {
    let source = no_op_source("lonely");
    let err = build_sequential(&source).unwrap_err();
    assert!(matches!(err, InvalidTopologyError::SourceWithoutOutput(_)));
}

#[test]
fn parallel_walks_a_diamond_and_dedupes_by_name() {
    let source = no_op_source("source");
    let left = pass_through_operator("left");
    let right = pass_through_operator("right");
    let sink = discard_sink("sink");

    connect_output(&source, &left);
    connect_output(&source, &right);
    connect_output(&left, &sink);
    connect_output(&right, &sink);

    let topology = build_parallel(&[source]).unwrap();
    assert_eq!(topology.operators.len(), 2);
    assert_eq!(topology.sinks.len(), 1);
    assert_eq!(topology.sinks[0].name(), "sink");
}

#[test]
fn parallel_fails_on_operator_without_output() {
    let source = no_op_source("source");
    let operator = pass_through_operator("dead_end");
    connect_output(&source, &operator);

    let err = build_parallel(&[source]).unwrap_err();
    assert!(matches!(err, InvalidTopologyError::OperatorWithoutOutput(_)));
}

#[test]
fn parallel_requires_at_least_one_source() {
    let err = build_parallel::<i32>(&[]).unwrap_err();
    assert!(matches!(err, InvalidTopologyError::NoSources));
}
