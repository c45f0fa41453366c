//! Conversion of a [`Maybe`] into a [`TaskMonad`].

use super::Maybe;
use crate::task::{TaskError, TaskMonad};

/// Converts an optional value into a computation handle.
///
/// A present value becomes a handle that yields it without suspending; an
/// absent value becomes a handle that fails with [`TaskError::Absent`]
/// (message `"Maybe was None"`) when it is run.
///
/// # Examples
///
/// ```rust
/// use monadic_tasks::maybe::{Maybe, MaybeTaskMonadExt};
///
/// # futures::executor::block_on(async {
/// let present = Maybe::some(42).to_task_monad();
/// assert_eq!(present.get_result().await.unwrap(), 42);
///
/// let absent = Maybe::<i32>::none().to_task_monad();
/// let error = absent.get_result().await.unwrap_err();
/// assert_eq!(error.to_string(), "Maybe was None");
/// # });
/// ```
pub trait MaybeTaskMonadExt<T> {
    /// Turns `self` into a [`TaskMonad`].
    fn to_task_monad(self) -> TaskMonad<T>;
}

impl<T: Clone + Send + Sync + 'static> MaybeTaskMonadExt<T> for Maybe<T> {
    fn to_task_monad(self) -> TaskMonad<T> {
        match self.into_option() {
            Some(value) => TaskMonad::unit(value),
            None => {
                tracing::trace!("bridging an absent value into a failing task monad");
                TaskMonad::fail(TaskError::Absent)
            }
        }
    }
}

impl<T: Clone + Send + Sync + 'static> From<Maybe<T>> for TaskMonad<T> {
    fn from(maybe: Maybe<T>) -> Self {
        maybe.to_task_monad()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_present_value_yields_value() {
        let monad = Maybe::some(42).to_task_monad();
        assert_eq!(futures::executor::block_on(monad.get_result()).unwrap(), 42);
    }

    #[rstest]
    fn test_absent_value_fails_at_run_time() {
        let monad: TaskMonad<i32> = Maybe::none().into();
        let error = futures::executor::block_on(monad.get_result()).unwrap_err();
        assert!(error.is_absent());
        assert_eq!(error.to_string(), "Maybe was None");
    }
}
