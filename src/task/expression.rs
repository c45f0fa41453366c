//! Expression nodes: the deferred steps a [`TaskMonad`](super::TaskMonad) is
//! built from.
//!
//! A node describes one step of a chain. Nothing happens when a node is
//! built. [`run`] interprets a chain with an explicit stack of pending steps
//! rather than one nested future per node, so the length of a chain never
//! becomes stack depth. Dropping a chain is iterative for the same reason.
//!
//! Nodes are type-erased: values travel between steps as [`Value`] and are
//! restored to their static type by the closures `TaskMonad` wraps around
//! user callbacks.
//!
//! # Invariants
//!
//! - Steps of one chain run in order, innermost source first
//! - Once a step fails, no later step of the chain is invoked

use std::any::Any;
use std::future::Future;
use std::mem;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, LazyLock};

use futures::FutureExt;
use futures::future::BoxFuture;

use super::error::{TaskError, TaskResult};

/// A type-erased value flowing between steps.
pub(crate) type Value = Box<dyn Any + Send + Sync>;

/// A zero-argument producer yielding a fresh future on every run.
pub(crate) type Producer = Box<dyn Fn() -> BoxFuture<'static, TaskResult<Value>> + Send + Sync>;

/// A (fallible) transform applied to the value of the source.
pub(crate) type Transform = Box<dyn Fn(Value) -> TaskResult<Value> + Send + Sync>;

/// A continuation returning the next chain to run.
pub(crate) type Continuation = Box<dyn Fn(Value) -> TaskResult<Arc<Expression>> + Send + Sync>;

/// An asynchronous side effect started from the chain's value.
pub(crate) type Effect = Box<dyn Fn(&Value) -> BoxFuture<'static, TaskResult<()>> + Send + Sync>;

/// Stands in for the source of a node being torn down.
static DETACHED: LazyLock<Arc<Expression>> =
    LazyLock::new(|| Arc::new(Expression::Fail(TaskError::msg("detached expression"))));

/// One deferred step of a computation chain.
pub(crate) enum Expression {
    /// An available value, or a producer invoked at run time.
    Pure(Pure),
    /// Runs `source`, then applies `step` to its value.
    Step {
        source: Arc<Expression>,
        step: Arc<Step>,
    },
    /// Fails with the held error on every run.
    Fail(TaskError),
}

/// The payload of [`Expression::Pure`].
pub(crate) enum Pure {
    /// Yields a copy of the held value.
    Ready(Box<dyn Fn() -> Value + Send + Sync>),
    /// Calls the producer once per run and awaits its future.
    Deferred(Producer),
}

/// What a [`Expression::Step`] does with the value of its source.
pub(crate) enum Step {
    Map(Transform),
    /// Runs the chain the continuation returns.
    Bind(Continuation),
    /// Awaits the effect, then passes the value on unchanged.
    Tap(Effect),
}

impl Expression {
    pub(crate) fn step(source: Arc<Self>, step: Step) -> Self {
        Self::Step {
            source,
            step: Arc::new(step),
        }
    }

    /// The name of this node's kind.
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Pure(_) => "Pure",
            Self::Step { step, .. } => match step.as_ref() {
                Step::Map(_) => "Map",
                Step::Bind(_) => "Bind",
                Step::Tap(_) => "Tap",
            },
            Self::Fail(_) => "Fail",
        }
    }

    fn detach_source(&mut self) -> Option<Arc<Self>> {
        match self {
            Self::Step { source, .. } if !Arc::ptr_eq(source, &*DETACHED) => {
                Some(mem::replace(source, Arc::clone(&*DETACHED)))
            }
            _ => None,
        }
    }
}

impl Drop for Expression {
    fn drop(&mut self) {
        let mut detached: Vec<Arc<Self>> = self.detach_source().into_iter().collect();
        while let Some(node) = detached.pop() {
            if let Ok(mut expression) = Arc::try_unwrap(node) {
                detached.extend(expression.detach_source());
            }
        }
    }
}

/// Runs a chain, yielding its value or its failure.
///
/// Descends through the sources of `root` pushing each step, evaluates the
/// innermost node, then applies the pending steps in a loop. A `Bind` step
/// descends into the chain its continuation returns. `Pure(Ready)` and
/// `Fail` roots complete without suspending.
pub(crate) async fn run(root: Arc<Expression>) -> TaskResult<Value> {
    let mut pending: Vec<Arc<Step>> = Vec::new();
    let mut current = root;

    'descend: loop {
        let mut outcome = loop {
            let source = match current.as_ref() {
                Expression::Step { source, step } => {
                    pending.push(Arc::clone(step));
                    Arc::clone(source)
                }
                Expression::Pure(pure) => break produce(pure).await,
                Expression::Fail(error) => break Err(error.clone()),
            };
            current = source;
        };

        while let Some(step) = pending.pop() {
            let value = outcome?;
            outcome = match step.as_ref() {
                Step::Map(transform) => invoke(|| transform(value)),
                Step::Tap(effect) => run_effect(effect, &value).await.map(|()| value),
                Step::Bind(continuation) => {
                    current = invoke(|| continuation(value))?;
                    continue 'descend;
                }
            };
        }

        return outcome;
    }
}

async fn produce(pure: &Pure) -> TaskResult<Value> {
    match pure {
        Pure::Ready(value) => invoke(|| Ok(value())),
        Pure::Deferred(producer) => guard(invoke(|| Ok(producer()))?).await,
    }
}

async fn run_effect(effect: &Effect, value: &Value) -> TaskResult<()> {
    let pending = invoke(|| Ok(effect(value)))?;
    guard(pending).await
}

/// Boxes a value for the trip through the chain.
pub(crate) fn erase<T: Send + Sync + 'static>(value: T) -> Value {
    Box::new(value)
}

/// Takes back a value boxed by [`erase`].
///
/// # Panics
///
/// Panics if `value` is not a `T`. Nodes are only ever assembled by the
/// typed `TaskMonad` operations, so this indicates a bug in this module.
pub(crate) fn restore<T: 'static>(value: Value) -> T {
    *value
        .downcast::<T>()
        .expect("Type mismatch in task monad chain")
}

/// Borrows a value boxed by [`erase`].
///
/// # Panics
///
/// Panics if `value` is not a `T`, like [`restore`].
pub(crate) fn restore_ref<T: 'static>(value: &Value) -> &T {
    (**value)
        .downcast_ref::<T>()
        .expect("Type mismatch in task monad chain")
}

/// Calls a user-supplied callback, turning a panic into a failed run.
pub(crate) fn invoke<R>(callback: impl FnOnce() -> TaskResult<R>) -> TaskResult<R> {
    catch_unwind(AssertUnwindSafe(callback))
        .unwrap_or_else(|payload| Err(TaskError::from_panic(payload.as_ref())))
}

/// Polls a user-supplied future, turning a panic into a failed run.
pub(crate) async fn guard<R>(pending: impl Future<Output = TaskResult<R>>) -> TaskResult<R> {
    AssertUnwindSafe(pending)
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| Err(TaskError::from_panic(payload.as_ref())))
}
