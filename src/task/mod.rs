//! `TaskMonad` - Lazily composed asynchronous computations.
//!
//! A [`TaskMonad<T>`] is a *recipe* for an asynchronous computation that
//! yields a `T` or fails with a [`TaskError`]. Composing a handle with
//! [`map`](TaskMonad::map), [`bind`](TaskMonad::bind) or
//! [`perform_side_effect_async`](TaskMonad::perform_side_effect_async) never
//! starts any work: it returns a new handle wrapping a new expression node
//! that refers to the previous handle. Work happens only when the handle is
//! run with [`get_result`](TaskMonad::get_result) (or awaited directly), and
//! it happens again, from the root, on every run.
//!
//! # Examples
//!
//! ```rust
//! use monadic_tasks::task::TaskMonad;
//!
//! # futures::executor::block_on(async {
//! let chain = TaskMonad::unit(5)
//!     .bind(|x| TaskMonad::unit(x + 5))
//!     .map(|x| x * 2);
//!
//! assert_eq!(chain.get_result().await.unwrap(), 20);
//! # });
//! ```
//!
//! # Failure Propagation
//!
//! Every failure travels through the same channel. Once a step fails, no
//! later callback is invoked:
//!
//! ```rust
//! use monadic_tasks::task::TaskMonad;
//!
//! # futures::executor::block_on(async {
//! let chain = TaskMonad::<i32>::fail("boom").map(|x| x + 1);
//!
//! let error = chain.get_result().await.unwrap_err();
//! assert_eq!(error.to_string(), "boom");
//! # });
//! ```
//!
//! # Concurrency
//!
//! [`TaskMonad::sequence`] runs a batch of handles concurrently inside the
//! caller's task and yields their values in input order. The library never
//! spawns tasks and owns no executor; it runs on whatever runtime polls it.

mod error;
mod expression;

use std::future::{Future, IntoFuture};
use std::marker::PhantomData;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::Instrument;

use expression::{Expression, Pure, Step, Value, erase, restore, restore_ref};

pub use error::{TaskError, TaskResult};

/// A deferred, composable asynchronous computation.
///
/// Cloning a handle is cheap and shares its (immutable) expression tree.
/// Since nodes never change and runs never memoize, a clone behaves exactly
/// like an independently built copy of the same chain.
///
/// # Type Parameters
///
/// - `T`: The type of the value produced when the computation succeeds.
///
/// # Monad Laws
///
/// 1. **Left Identity**: `TaskMonad::unit(a).bind(f) == f(a)`
/// 2. **Right Identity**: `m.bind(TaskMonad::unit) == m`
/// 3. **Associativity**: `m.bind(f).bind(g) == m.bind(|x| f(x).bind(g))`
///
/// # Examples
///
/// ```rust
/// use monadic_tasks::task::TaskMonad;
///
/// # futures::executor::block_on(async {
/// let monad = TaskMonad::unit(21).map(|x| x * 2);
/// assert_eq!(monad.await.unwrap(), 42);
/// # });
/// ```
pub struct TaskMonad<T> {
    expression: Arc<Expression>,
    _result: PhantomData<fn() -> T>,
}

impl<T> Clone for TaskMonad<T> {
    fn clone(&self) -> Self {
        Self::from_shared(Arc::clone(&self.expression))
    }
}

impl<T> std::fmt::Debug for TaskMonad<T> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("TaskMonad")
            .field("expression", &self.expression.name())
            .finish()
    }
}

impl<T> TaskMonad<T> {
    const fn from_shared(expression: Arc<Expression>) -> Self {
        Self {
            expression,
            _result: PhantomData,
        }
    }

    fn from_expression(expression: Expression) -> Self {
        Self::from_shared(Arc::new(expression))
    }

    fn then<U>(&self, step: Step) -> TaskMonad<U> {
        TaskMonad::from_expression(Expression::step(Arc::clone(&self.expression), step))
    }
}

// =============================================================================
// Constructors
// =============================================================================

impl<T: Clone + Send + Sync + 'static> TaskMonad<T> {
    /// Wraps an already available value.
    ///
    /// Running the handle yields a clone of `value` without suspending.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use monadic_tasks::task::TaskMonad;
    ///
    /// # futures::executor::block_on(async {
    /// assert_eq!(TaskMonad::unit(5).get_result().await.unwrap(), 5);
    /// # });
    /// ```
    pub fn unit(value: T) -> Self {
        Self::from_expression(Expression::Pure(Pure::Ready(Box::new(move || {
            erase(value.clone())
        }))))
    }
}

impl<T: Send + Sync + 'static> TaskMonad<T> {
    /// Wraps a zero-argument asynchronous producer.
    ///
    /// The producer is not called here. It is called once per run, at run
    /// time, and its future is awaited; an `Err` (or a panic) becomes the
    /// failure of the run.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use monadic_tasks::task::{TaskError, TaskMonad};
    ///
    /// # futures::executor::block_on(async {
    /// let monad = TaskMonad::unit_with(|| async { Ok::<_, TaskError>(5) });
    /// assert_eq!(monad.get_result().await.unwrap(), 5);
    /// # });
    /// ```
    pub fn unit_with<F, Fut, E>(producer: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<TaskError> + 'static,
    {
        Self::from_expression(Expression::Pure(Pure::Deferred(Box::new(
            move || -> BoxFuture<'static, TaskResult<Value>> {
                producer()
                    .map(|result| result.map(erase).map_err(Into::into))
                    .boxed()
            },
        ))))
    }

    /// Creates a handle that fails with `error` every time it is run.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use monadic_tasks::task::TaskMonad;
    ///
    /// # futures::executor::block_on(async {
    /// let error = TaskMonad::<i32>::fail("Test exception").get_result().await.unwrap_err();
    /// assert_eq!(error.to_string(), "Test exception");
    /// # });
    /// ```
    pub fn fail(error: impl Into<TaskError>) -> Self {
        Self::from_expression(Expression::Fail(error.into()))
    }
}

// =============================================================================
// Execution
// =============================================================================

impl<T: Send + Sync + 'static> TaskMonad<T> {
    /// Runs the chain and returns its value or its failure.
    ///
    /// This is the only operation that performs work. Each call re-runs the
    /// whole chain from its root.
    ///
    /// # Errors
    ///
    /// Returns the first failure met while walking the chain.
    pub async fn get_result(&self) -> TaskResult<T> {
        expression::run(Arc::clone(&self.expression))
            .await
            .map(restore)
    }
}

impl<T: Send + Sync + 'static> IntoFuture for TaskMonad<T> {
    type Output = TaskResult<T>;
    type IntoFuture = BoxFuture<'static, TaskResult<T>>;

    /// Runs an owned handle, so that it can be awaited directly:
    ///
    /// ```rust
    /// use monadic_tasks::task::TaskMonad;
    ///
    /// # futures::executor::block_on(async {
    /// assert_eq!(TaskMonad::unit(42).await.unwrap(), 42);
    /// # });
    /// ```
    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { self.get_result().await })
    }
}

// =============================================================================
// Functor / Monad Operations
// =============================================================================

impl<T: Send + Sync + 'static> TaskMonad<T> {
    /// Transforms the value of this computation.
    ///
    /// The transform runs after this handle succeeds; a panic inside it
    /// fails the run like any other failure.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use monadic_tasks::task::TaskMonad;
    ///
    /// # futures::executor::block_on(async {
    /// let monad = TaskMonad::unit(5).map(|x| x * 2).map(|x| x / 2);
    /// assert_eq!(monad.get_result().await.unwrap(), 5);
    /// # });
    /// ```
    #[must_use]
    pub fn map<U, F>(&self, transform: F) -> TaskMonad<U>
    where
        F: Fn(T) -> U + Send + Sync + 'static,
        U: Send + Sync + 'static,
    {
        self.try_map(move |value| Ok::<_, TaskError>(transform(value)))
    }

    /// Transforms the value of this computation with a fallible function.
    ///
    /// An `Err` returned by `transform` becomes the failure of the run.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use monadic_tasks::task::TaskMonad;
    ///
    /// # futures::executor::block_on(async {
    /// let parsed = TaskMonad::unit("12".to_string())
    ///     .try_map(|text| text.parse::<i32>().map_err(|error| error.to_string()));
    /// assert_eq!(parsed.get_result().await.unwrap(), 12);
    /// # });
    /// ```
    #[must_use]
    pub fn try_map<U, F, E>(&self, transform: F) -> TaskMonad<U>
    where
        F: Fn(T) -> Result<U, E> + Send + Sync + 'static,
        E: Into<TaskError> + 'static,
        U: Send + Sync + 'static,
    {
        let erased = move |value: Value| -> TaskResult<Value> {
            transform(restore(value)).map(erase).map_err(Into::into)
        };
        self.then(Step::Map(Box::new(erased)))
    }

    /// Chains a computation that depends on the value of this one.
    ///
    /// `continuation` is called once per run, only after this handle
    /// succeeds, and the handle it returns is run in turn.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use monadic_tasks::task::TaskMonad;
    ///
    /// # futures::executor::block_on(async {
    /// let monad = TaskMonad::unit(5)
    ///     .bind(|x| TaskMonad::unit(x + 5))
    ///     .bind(|x| TaskMonad::unit(x * 2));
    /// assert_eq!(monad.get_result().await.unwrap(), 20);
    /// # });
    /// ```
    #[must_use]
    pub fn bind<U, F>(&self, continuation: F) -> TaskMonad<U>
    where
        F: Fn(T) -> TaskMonad<U> + Send + Sync + 'static,
        U: Send + Sync + 'static,
    {
        self.try_bind(move |value| Ok::<_, TaskError>(continuation(value)))
    }

    /// Chains a computation whose construction may itself fail.
    ///
    /// An `Err` returned by `continuation` fails the run without running
    /// any further handle.
    #[must_use]
    pub fn try_bind<U, F, E>(&self, continuation: F) -> TaskMonad<U>
    where
        F: Fn(T) -> Result<TaskMonad<U>, E> + Send + Sync + 'static,
        E: Into<TaskError> + 'static,
        U: Send + Sync + 'static,
    {
        let erased = move |value: Value| -> TaskResult<Arc<Expression>> {
            continuation(restore(value))
                .map(|next: TaskMonad<U>| next.expression)
                .map_err(Into::into)
        };
        self.then(Step::Bind(Box::new(erased)))
    }

    /// Binds a same-type transform.
    ///
    /// An alias for [`map`](Self::map) restricted to `T -> T`.
    #[must_use]
    pub fn bind_pure<F>(&self, transform: F) -> Self
    where
        F: Fn(T) -> T + Send + Sync + 'static,
    {
        self.map(transform)
    }
}

// =============================================================================
// Side Effects
// =============================================================================

impl<T: Send + Sync + 'static> TaskMonad<T> {
    /// Observes the value with a synchronous side effect.
    ///
    /// The resulting handle yields the original value unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use monadic_tasks::task::TaskMonad;
    /// use std::sync::atomic::{AtomicI32, Ordering};
    /// use std::sync::Arc;
    ///
    /// # futures::executor::block_on(async {
    /// let seen = Arc::new(AtomicI32::new(0));
    /// let seen_clone = Arc::clone(&seen);
    ///
    /// let monad = TaskMonad::unit(5)
    ///     .perform_side_effect(move |value| seen_clone.store(*value, Ordering::SeqCst));
    ///
    /// assert_eq!(monad.get_result().await.unwrap(), 5);
    /// assert_eq!(seen.load(Ordering::SeqCst), 5);
    /// # });
    /// ```
    #[must_use]
    pub fn perform_side_effect<F>(&self, effect: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.map(move |value| {
            effect(&value);
            value
        })
    }

    /// Observes the value with a fallible synchronous side effect.
    ///
    /// An `Err` from `effect` replaces the value as the outcome of the run.
    #[must_use]
    pub fn try_perform_side_effect<F, E>(&self, effect: F) -> Self
    where
        F: Fn(&T) -> Result<(), E> + Send + Sync + 'static,
        E: Into<TaskError> + 'static,
    {
        self.try_map(move |value| effect(&value).map(|()| value))
    }

    /// Observes the value with an asynchronous side effect.
    ///
    /// The effect receives a clone of the value and is awaited before the
    /// original value is yielded. Its failure supersedes the value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use monadic_tasks::task::{TaskError, TaskMonad};
    ///
    /// # futures::executor::block_on(async {
    /// let monad = TaskMonad::unit(10)
    ///     .perform_side_effect_async(|value| async move {
    ///         assert_eq!(value, 10);
    ///         Ok::<_, TaskError>(())
    ///     });
    /// assert_eq!(monad.get_result().await.unwrap(), 10);
    /// # });
    /// ```
    #[must_use]
    pub fn perform_side_effect_async<F, Fut, E>(&self, effect: F) -> Self
    where
        T: Clone,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<TaskError> + 'static,
    {
        let erased = move |value: &Value| -> BoxFuture<'static, TaskResult<()>> {
            effect(restore_ref::<T>(value).clone())
                .map(|result| result.map_err(Into::into))
                .boxed()
        };
        self.then(Step::Tap(Box::new(erased)))
    }
}

// =============================================================================
// Flatten / Sequence
// =============================================================================

impl<T: Send + Sync + 'static> TaskMonad<T> {
    /// Runs the outer handle and returns the inner handle it yields.
    ///
    /// The inner handle is *not* run: its work stays deferred until the
    /// caller runs it.
    ///
    /// # Errors
    ///
    /// Returns the failure of the outer handle.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use monadic_tasks::task::TaskMonad;
    ///
    /// # futures::executor::block_on(async {
    /// let nested = TaskMonad::unit(TaskMonad::unit(5));
    /// let inner = TaskMonad::flatten(&nested).await.unwrap();
    /// assert_eq!(inner.get_result().await.unwrap(), 5);
    /// # });
    /// ```
    pub async fn flatten(nested: &TaskMonad<Self>) -> TaskResult<Self> {
        let inner = nested.get_result().await?;
        tracing::trace!(inner = ?inner, "flattened nested task monad");
        Ok(inner)
    }
}

impl<T: Clone + Send + Sync + 'static> TaskMonad<T> {
    /// Runs every handle concurrently and collects their values.
    ///
    /// The values are returned, wrapped in a new handle, in the order of
    /// `handles`, whatever order the computations finish in. Handles are
    /// polled concurrently within the calling task; nothing is spawned.
    /// Every handle runs to completion, even after another has failed.
    ///
    /// # Errors
    ///
    /// Once all handles have finished, returns the first failure observed.
    /// When several handles fail, which failure is reported depends on
    /// completion order and is not necessarily the first by position. No
    /// partial results are kept.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use monadic_tasks::task::TaskMonad;
    ///
    /// # futures::executor::block_on(async {
    /// let monads = vec![TaskMonad::unit(1), TaskMonad::unit(2), TaskMonad::unit(3)];
    /// let joined = TaskMonad::sequence(monads).await.unwrap();
    /// assert_eq!(joined.get_result().await.unwrap(), vec![1, 2, 3]);
    /// # });
    /// ```
    pub async fn sequence<I>(handles: I) -> TaskResult<TaskMonad<Vec<T>>>
    where
        I: IntoIterator<Item = Self>,
    {
        let handles: Vec<Self> = handles.into_iter().collect();
        let count = handles.len();
        let span = tracing::debug_span!("task_monad_sequence", count);

        async move {
            let mut running: FuturesUnordered<_> = handles
                .iter()
                .enumerate()
                .map(|(index, handle)| handle.get_result().map(move |outcome| (index, outcome)))
                .collect();
            let mut values: Vec<Option<T>> = (0..count).map(|_| None).collect();
            let mut failure: Option<TaskError> = None;

            while let Some((index, outcome)) = running.next().await {
                match outcome {
                    Ok(value) => values[index] = Some(value),
                    Err(error) => {
                        failure.get_or_insert(error);
                    }
                }
            }

            match failure {
                Some(error) => Err(error),
                None => Ok(TaskMonad::unit(values.into_iter().flatten().collect())),
            }
        }
        .instrument(span)
        .await
    }
}
