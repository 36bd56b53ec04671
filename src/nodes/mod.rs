//! Built-in nodes: thin closure wrappers plus a couple of trivial
//! terminal/passthrough nodes. These are the nodes
//! [`crate::registry::init_defaults`] registers so a topology expressed
//! purely as names (the daemon/CLI path) always has somewhere to land.

use std::fmt::Debug;

use crate::context::{Context, NodeLogger};
use crate::error::NodeError;
use crate::node::{Emission, Input, Node, Operator, Sink, Source};

/// Wraps a plain closure as a [`Source`].
pub struct FnSource<T, F> {
    name: String,
    context: Context,
    read_fn: F,
    _marker: std::marker::PhantomData<T>,
}

impl<T, F> FnSource<T, F>
where
    F: FnMut(&mut dyn FnMut(Emission<T>)) -> Result<(), NodeError> + Send,
{
    pub fn new(name: impl Into<String>, context: Context, read_fn: F) -> Self {
        Self {
            name: name.into(),
            context,
            read_fn,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T, F> Node for FnSource<T, F>
where
    T: Send,
    F: FnMut(&mut dyn FnMut(Emission<T>)) -> Result<(), NodeError> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn context(&self) -> &Context {
        &self.context
    }
}

impl<T, F> Source<T> for FnSource<T, F>
where
    T: Send,
    F: FnMut(&mut dyn FnMut(Emission<T>)) -> Result<(), NodeError> + Send,
{
    fn read(&mut self, emit: &mut dyn FnMut(Emission<T>)) -> Result<(), NodeError> {
        (self.read_fn)(emit)
    }
}

/// Wraps a plain closure as an [`Operator`].
pub struct FnOperator<T, F> {
    name: String,
    context: Context,
    apply_fn: F,
    _marker: std::marker::PhantomData<T>,
}

impl<T, F> FnOperator<T, F>
where
    F: FnMut(Input<T>, &mut dyn FnMut(Emission<T>)) -> Result<(), NodeError> + Send,
{
    pub fn new(name: impl Into<String>, context: Context, apply_fn: F) -> Self {
        Self {
            name: name.into(),
            context,
            apply_fn,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T, F> Node for FnOperator<T, F>
where
    T: Send,
    F: FnMut(Input<T>, &mut dyn FnMut(Emission<T>)) -> Result<(), NodeError> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn context(&self) -> &Context {
        &self.context
    }
}

impl<T, F> Operator<T> for FnOperator<T, F>
where
    T: Send,
    F: FnMut(Input<T>, &mut dyn FnMut(Emission<T>)) -> Result<(), NodeError> + Send,
{
    fn apply(
        &mut self,
        input: Input<T>,
        emit: &mut dyn FnMut(Emission<T>),
    ) -> Result<(), NodeError> {
        (self.apply_fn)(input, emit)
    }
}

/// Wraps a plain closure as a [`Sink`].
pub struct FnSink<T, F> {
    name: String,
    context: Context,
    write_fn: F,
    _marker: std::marker::PhantomData<T>,
}

impl<T, F> FnSink<T, F>
where
    F: FnMut(Input<T>) -> Result<(), NodeError> + Send,
{
    pub fn new(name: impl Into<String>, context: Context, write_fn: F) -> Self {
        Self {
            name: name.into(),
            context,
            write_fn,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T, F> Node for FnSink<T, F>
where
    T: Send,
    F: FnMut(Input<T>) -> Result<(), NodeError> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn context(&self) -> &Context {
        &self.context
    }
}

impl<T, F> Sink<T> for FnSink<T, F>
where
    T: Send,
    F: FnMut(Input<T>) -> Result<(), NodeError> + Send,
{
    fn write(&mut self, input: Input<T>) -> Result<(), NodeError> {
        (self.write_fn)(input)
    }
}

/// Discards every item it receives, logging one line per write at debug
/// level. A topology's fallback terminal node when nothing else makes
/// sense as a sink.
pub struct NoopSink<T> {
    name: String,
    context: Context,
    logger: NodeLogger,
    _marker: std::marker::PhantomData<T>,
}

impl<T> NoopSink<T> {
    pub fn new(name: impl Into<String>, context: Context) -> Self {
        let name = name.into();
        let logger = context.create_logger(&name);
        Self {
            name,
            context,
            logger,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T> Node for NoopSink<T>
where
    T: Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn context(&self) -> &Context {
        &self.context
    }
}

impl<T> Sink<T> for NoopSink<T>
where
    T: Send,
{
    fn write(&mut self, input: Input<T>) -> Result<(), NodeError> {
        match input {
            Input::Single(e) => self.logger.debug(&format!(
                "discarding {}",
                if e.is_absent() { "an absent value" } else { "an item" }
            )),
            Input::Zipped(map) => self
                .logger
                .debug(&format!("discarding a zipped input with {} producers", map.len())),
        }
        Ok(())
    }
}

/// Identity operator that logs every item it sees at debug level before
/// passing it through unchanged. Useful in an operator list named purely
/// by string when a pipeline needs visibility into what's flowing through
/// a given point without otherwise changing behavior.
pub struct LogOperator<T> {
    name: String,
    context: Context,
    logger: NodeLogger,
    _marker: std::marker::PhantomData<T>,
}

impl<T> LogOperator<T> {
    pub fn new(name: impl Into<String>, context: Context) -> Self {
        let name = name.into();
        let logger = context.create_logger(&name);
        Self {
            name,
            context,
            logger,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T> Node for LogOperator<T>
where
    T: Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn context(&self) -> &Context {
        &self.context
    }
}

impl<T> Operator<T> for LogOperator<T>
where
    T: Send + Debug,
{
    fn apply(
        &mut self,
        input: Input<T>,
        emit: &mut dyn FnMut(Emission<T>),
    ) -> Result<(), NodeError> {
        match input {
            Input::Single(e) => {
                match &e {
                    Emission::Item(item) => self.logger.debug(&format!("{item:?}")),
                    Emission::Absent => self.logger.debug("<absent>"),
                }
                emit(e);
            }
            Input::Zipped(map) => {
                for (producer, e) in &map {
                    match e {
                        Emission::Item(item) => {
                            self.logger.debug(&format!("{producer}: {item:?}"))
                        }
                        Emission::Absent => self.logger.debug(&format!("{producer}: <absent>")),
                    }
                }
                for (_, e) in map {
                    emit(e);
                }
            }
        }
        Ok(())
    }
}
