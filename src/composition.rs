//! The operator-composition algebra: fusing two operators into one, and
//! folding a list of operators into a single composed operator.
//!
//! A composed operator's `apply` calls `A` then, unless `A` emitted the
//! absent sentinel and fail-fast is enabled, feeds `A`'s output into `B`.
//! `open`/`close` call `A` then `B`.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::context::Context;
use crate::error::{InitializationError, NodeError, ShutdownError};
use crate::node::{Emission, Input, Node, NodeHandle, Operator};

/// A virtual operator formed from two operators `A: In -> Mid` and
/// `B: Mid -> Out`, collapsed here to the single wire type `T` every node in
/// a topology shares.
pub struct ComposedOperator<T> {
    name: String,
    context: Context,
    a: Arc<Mutex<dyn Operator<T> + Send>>,
    b: Arc<Mutex<dyn Operator<T> + Send>>,
    /// When true (the default), `B` is not invoked for an item `A` reported
    /// absent. When false, `B` is invoked with [`Emission::Absent`] and must
    /// cope with it itself.
    fail_fast: bool,
}

impl<T> ComposedOperator<T> {
    pub fn new(
        a: Arc<Mutex<dyn Operator<T> + Send>>,
        b: Arc<Mutex<dyn Operator<T> + Send>>,
    ) -> Self {
        let (a_name, b_name) = {
            let a_guard = a.lock();
            let b_guard = b.lock();
            (a_guard.name().to_string(), b_guard.name().to_string())
        };
        Self {
            name: format!("({a_name} -> {b_name})"),
            context: Context::new(),
            a,
            b,
            fail_fast: true,
        }
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }
}

impl<T> Node for ComposedOperator<T>
where
    T: Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn context(&self) -> &Context {
        &self.context
    }

    fn open(&mut self) -> Result<(), InitializationError> {
        self.a.lock().open()?;
        self.b.lock().open()?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), ShutdownError> {
        let a_result = self.a.lock().close();
        let b_result = self.b.lock().close();
        a_result.and(b_result)
    }
}

impl<T> Operator<T> for ComposedOperator<T>
where
    T: Send + 'static,
{
    fn apply(
        &mut self,
        input: Input<T>,
        emit: &mut dyn FnMut(Emission<T>),
    ) -> Result<(), NodeError> {
        let fail_fast = self.fail_fast;
        let b = &self.b;
        let mut stage_err: Option<NodeError> = None;
        self.a.lock().apply(input, &mut |a_out| {
            if stage_err.is_some() {
                return;
            }
            if fail_fast && a_out.is_absent() {
                return;
            }
            if let Err(e) = b.lock().apply(Input::single(a_out), emit) {
                stage_err = Some(e);
            }
        })?;
        match stage_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Fuse two operator handles into one composed operator handle.
///
/// `compose_list([a]) == a` (the composition identity): passing a
/// single-element list returns that element's handle unchanged rather than
/// wrapping it.
pub fn compose<T>(a: Arc<NodeHandle<T>>, b: Arc<NodeHandle<T>>) -> Arc<NodeHandle<T>>
where
    T: Send + 'static,
{
    let a_op = a
        .as_operator()
        .expect("compose() requires an operator handle");
    let b_op = b
        .as_operator()
        .expect("compose() requires an operator handle");
    let composed = ComposedOperator::new(a_op, b_op);
    let name = composed.name().to_string();
    let context = composed.context().clone();
    NodeHandle::from_operator_role(name, context, Arc::new(Mutex::new(composed)))
}

/// Fold a non-empty list of operator handles, left to right, into a single
/// composed handle.
///
/// # Panics
/// Panics if `operators` is empty: building a composed operator over zero
/// operators is always a caller bug, not a runtime condition.
pub fn compose_list<T>(operators: Vec<Arc<NodeHandle<T>>>) -> Arc<NodeHandle<T>>
where
    T: Send + 'static,
{
    let mut iter = operators.into_iter();
    let first = iter.next().expect("compose_list: no operator in list");
    iter.fold(first, compose)
}
