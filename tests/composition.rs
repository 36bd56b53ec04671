use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use dataflow_rt::composition::{compose, compose_list};
use dataflow_rt::node::{connect_output, Emission, Input};
use dataflow_rt::nodes::{FnOperator, FnSink, FnSource};
use dataflow_rt::prelude::*;

fn counting_operator(name: &str, counter: Arc<AtomicUsize>) -> Arc<NodeHandle<i32>> {
    NodeHandle::new_operator(FnOperator::new(
        name,
        Context::new(),
        move |input: Input<i32>, emit: &mut dyn FnMut(Emission<i32>)| {
            counter.fetch_add(1, Ordering::SeqCst);
            if let Input::Single(e) = input {
                emit(e);
            }
            Ok(())
        },
    ))
}

fn filtering_operator(name: &str, keep: fn(i32) -> bool) -> Arc<NodeHandle<i32>> {
    NodeHandle::new_operator(FnOperator::new(
        name,
        Context::new(),
        move |input: Input<i32>, emit: &mut dyn FnMut(Emission<i32>)| {
            if let Input::Single(Emission::Item(n)) = input {
                if keep(n) {
                    emit(Emission::Item(n));
                } else {
                    emit(Emission::Absent);
                }
            }
            Ok(())
        },
    ))
}

#[test]
fn compose_list_of_one_is_the_identity() {
    let counter = Arc::new(AtomicUsize::new(0));
    let a = counting_operator("a", counter);
    let folded = compose_list(vec![a.clone()]);
    assert!(Arc::ptr_eq(&a, &folded));
}

/// A chain of two operators, wired into a sequential topology, is folded by
/// `build_sequential` into one composed handle whose name reflects both
/// stages; its behavior is observed end-to-end through the sink.
#[test]
fn sequential_chain_composes_and_runs_in_order() {
    let stop = StopSignal::new();
    let values = vec![1, 2, 3, 4, 5, 6];
    let mut remaining = values.into_iter();

    let stop_for_source = stop.clone();
    let source = NodeHandle::new_source(FnSource::new(
        "numbers",
        Context::new(),
        move |emit: &mut dyn FnMut(Emission<i32>)| {
            match remaining.next() {
                Some(n) => emit(Emission::Item(n)),
                None => stop_for_source.set(),
            }
            Ok(())
        },
    ));

    let even = filtering_operator("even", |n| n % 2 == 0);
    let third_counter = Arc::new(AtomicUsize::new(0));
    let doubled = NodeHandle::new_operator(FnOperator::new(
        "doubled",
        Context::new(),
        {
            let third_counter = third_counter.clone();
            move |input: Input<i32>, emit: &mut dyn FnMut(Emission<i32>)| {
                third_counter.fetch_add(1, Ordering::SeqCst);
                if let Input::Single(Emission::Item(n)) = input {
                    emit(Emission::Item(n * 2));
                }
                Ok(())
            }
        },
    ));

    let collected = Arc::new(Mutex::new(Vec::new()));
    let sink = NodeHandle::new_sink(FnSink::new("collect", Context::new(), {
        let collected = collected.clone();
        move |input: Input<i32>| {
            if let Input::Single(Emission::Item(n)) = input {
                collected.lock().unwrap().push(n);
            }
            Ok(())
        }
    }));

    connect_output(&source, &even);
    connect_output(&even, &doubled);
    connect_output(&doubled, &sink);

    let topology = build_sequential(&source).unwrap();
    assert_eq!(
        topology.operator.as_ref().unwrap().name(),
        "(even -> doubled)"
    );

    let executor = SequentialExecutor::new(topology);
    executor.execute(&stop).unwrap();

    assert_eq!(*collected.lock().unwrap(), vec![4, 8, 12]);
    // `doubled` only ran for the 3 values `even` actually let through.
    assert_eq!(third_counter.load(Ordering::SeqCst), 3);
}

fn arithmetic_operator(name: &str, f: fn(i32) -> i32) -> Arc<NodeHandle<i32>> {
    NodeHandle::new_operator(FnOperator::new(
        name,
        Context::new(),
        move |input: Input<i32>, emit: &mut dyn FnMut(Emission<i32>)| {
            if let Input::Single(Emission::Item(n)) = input {
                emit(Emission::Item(f(n)));
            }
            Ok(())
        },
    ))
}

/// Drive `values` through a single composed operator, source to sink, and
/// return what the sink collected.
fn run_chain(values: Vec<i32>, chain: Arc<NodeHandle<i32>>) -> Vec<i32> {
    let stop = StopSignal::new();
    let mut remaining = values.into_iter();
    let stop_for_source = stop.clone();
    let source = NodeHandle::new_source(FnSource::new(
        "numbers",
        Context::new(),
        move |emit: &mut dyn FnMut(Emission<i32>)| {
            match remaining.next() {
                Some(n) => emit(Emission::Item(n)),
                None => stop_for_source.set(),
            }
            Ok(())
        },
    ));

    let collected = Arc::new(Mutex::new(Vec::new()));
    let sink = NodeHandle::new_sink(FnSink::new("collect", Context::new(), {
        let collected = collected.clone();
        move |input: Input<i32>| {
            if let Input::Single(Emission::Item(n)) = input {
                collected.lock().unwrap().push(n);
            }
            Ok(())
        }
    }));

    connect_output(&source, &chain);
    connect_output(&chain, &sink);

    let topology = build_sequential(&source).unwrap();
    let executor = SequentialExecutor::new(topology);
    executor.execute(&stop).unwrap();

    let collected = collected.lock().unwrap().clone();
    collected
}

/// `compose(A, compose(B, C))` must behave identically to
/// `compose(compose(A, B), C)` for every input sequence: the two groupings
/// wrap the same three stages, just folded in a different order.
#[test]
fn composition_is_associative() {
    let a = arithmetic_operator("add1", |n| n + 1);
    let b = arithmetic_operator("times2", |n| n * 2);
    let c = arithmetic_operator("sub3", |n| n - 3);

    let left = compose(compose(a.clone(), b.clone()), c.clone());
    let right = compose(a, compose(b, c));

    let values = vec![1, 2, 3, 4, 5];
    let left_out = run_chain(values.clone(), left);
    let right_out = run_chain(values, right);

    assert_eq!(left_out, right_out);
}
