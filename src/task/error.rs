//! The single failure channel of a [`TaskMonad`](super::TaskMonad) run.
//!
//! Every failure a chain can produce, whether it comes from an explicit
//! [`TaskMonad::fail`](super::TaskMonad::fail), a producer that resolves to
//! an error, a callback returning `Err`, a callback that panics, or an absent
//! [`Maybe`](crate::maybe::Maybe) being bridged, is reported as a
//! [`TaskError`].
//!
//! `TaskError` is cheap to clone: a failed node has to raise the same error
//! again every time its handle is run.
//!
//! # Examples
//!
//! ```rust
//! use monadic_tasks::task::TaskError;
//!
//! let error = TaskError::msg("boom");
//! assert_eq!(error.to_string(), "boom");
//!
//! let error: TaskError = "boom".into();
//! assert!(error.is_message());
//! ```

use std::any::Any;
use std::convert::Infallible;
use std::error::Error;
use std::sync::Arc;

/// The outcome of running a computation handle.
pub type TaskResult<T> = Result<T, TaskError>;

/// An error raised while running a [`TaskMonad`](super::TaskMonad).
///
/// # Examples
///
/// ```rust
/// use monadic_tasks::task::TaskError;
///
/// #[derive(Debug)]
/// struct Unavailable;
///
/// impl std::fmt::Display for Unavailable {
///     fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         write!(formatter, "service unavailable")
///     }
/// }
///
/// impl std::error::Error for Unavailable {}
///
/// let error = TaskError::new(Unavailable);
/// assert_eq!(error.to_string(), "service unavailable");
/// assert!(error.downcast_ref::<Unavailable>().is_some());
/// ```
#[derive(Debug, Clone, thiserror::Error)]
pub enum TaskError {
    /// A failure described only by its message.
    #[error("{0}")]
    Message(Arc<str>),

    /// A failure carrying an arbitrary error value.
    #[error(transparent)]
    Source(Arc<dyn Error + Send + Sync>),

    /// An absent optional value was converted into a computation.
    #[error("Maybe was None")]
    Absent,

    /// A user-supplied callback panicked while the chain was running.
    #[error("callback panicked: {0}")]
    Panicked(Arc<str>),
}

impl TaskError {
    /// Creates an error from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(Arc::from(message.into()))
    }

    /// Wraps an arbitrary error value.
    ///
    /// The wrapped error is kept as-is: its `Display` becomes this error's
    /// `Display`, and it can be recovered with [`TaskError::downcast_ref`].
    pub fn new<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::Source(Arc::new(error))
    }

    /// Builds a [`TaskError::Panicked`] from a panic payload.
    pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|message| (*message).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        Self::Panicked(Arc::from(message))
    }

    /// Returns the wrapped error if it is of type `E`.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: Error + 'static,
    {
        match self {
            Self::Source(error) => error.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Returns `true` if this error was created from a plain message.
    pub const fn is_message(&self) -> bool {
        matches!(self, Self::Message(_))
    }

    /// Returns `true` if this error comes from bridging an absent value.
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Returns `true` if this error was produced by a panicking callback.
    pub const fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked(_))
    }
}

impl From<&str> for TaskError {
    fn from(message: &str) -> Self {
        Self::Message(Arc::from(message))
    }
}

impl From<String> for TaskError {
    fn from(message: String) -> Self {
        Self::Message(Arc::from(message))
    }
}

impl From<Box<dyn Error + Send + Sync>> for TaskError {
    fn from(error: Box<dyn Error + Send + Sync>) -> Self {
        Self::Source(Arc::from(error))
    }
}

impl From<std::io::Error> for TaskError {
    fn from(error: std::io::Error) -> Self {
        Self::new(error)
    }
}

impl From<Infallible> for TaskError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[derive(Debug, PartialEq)]
    struct Timeout;

    impl std::fmt::Display for Timeout {
        fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(formatter, "timed out")
        }
    }

    impl Error for Timeout {}

    #[rstest]
    #[case(TaskError::msg("boom"), "boom")]
    #[case(TaskError::from("oops"), "oops")]
    #[case(TaskError::from("owned".to_string()), "owned")]
    #[case(TaskError::Absent, "Maybe was None")]
    #[case(TaskError::Panicked(Arc::from("bad index")), "callback panicked: bad index")]
    #[case(TaskError::new(Timeout), "timed out")]
    fn test_display(#[case] error: TaskError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    fn test_downcast_ref_recovers_wrapped_error() {
        let error = TaskError::new(Timeout);
        assert_eq!(error.downcast_ref::<Timeout>(), Some(&Timeout));
        assert!(error.downcast_ref::<std::io::Error>().is_none());
    }

    #[rstest]
    fn test_downcast_ref_on_message_is_none() {
        assert!(TaskError::msg("boom").downcast_ref::<Timeout>().is_none());
    }

    #[rstest]
    fn test_clone_shares_wrapped_error() {
        let error = TaskError::new(Timeout);
        let cloned = error.clone();
        match (&error, &cloned) {
            (TaskError::Source(left), TaskError::Source(right)) => {
                assert!(Arc::ptr_eq(left, right));
            }
            _ => panic!("expected wrapped errors"),
        }
    }

    #[derive(Debug)]
    struct ConnectionLost {
        cause: Timeout,
    }

    impl std::fmt::Display for ConnectionLost {
        fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(formatter, "connection lost")
        }
    }

    impl Error for ConnectionLost {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.cause)
        }
    }

    #[rstest]
    fn test_source_forwards_to_wrapped_error() {
        let error = TaskError::new(ConnectionLost { cause: Timeout });
        assert_eq!(error.to_string(), "connection lost");
        assert_eq!(
            error.source().map(ToString::to_string),
            Some("timed out".to_string())
        );
    }

    #[rstest]
    fn test_source_is_none_when_wrapped_error_has_none() {
        assert!(TaskError::new(Timeout).source().is_none());
        assert!(TaskError::msg("boom").source().is_none());
    }

    #[rstest]
    fn test_from_panic_payload_str() {
        let payload: Box<dyn Any + Send> = Box::new("index out of bounds");
        let error = TaskError::from_panic(payload.as_ref());
        assert!(error.is_panic());
        assert_eq!(error.to_string(), "callback panicked: index out of bounds");
    }

    #[rstest]
    fn test_from_panic_payload_string() {
        let payload: Box<dyn Any + Send> = Box::new(format!("value {}", 3));
        let error = TaskError::from_panic(payload.as_ref());
        assert_eq!(error.to_string(), "callback panicked: value 3");
    }

    #[rstest]
    fn test_from_panic_unknown_payload() {
        let payload: Box<dyn Any + Send> = Box::new(17_u8);
        let error = TaskError::from_panic(payload.as_ref());
        assert_eq!(error.to_string(), "callback panicked: unknown panic payload");
    }

    #[rstest]
    fn test_predicates() {
        assert!(TaskError::Absent.is_absent());
        assert!(!TaskError::Absent.is_message());
        assert!(TaskError::msg("x").is_message());
        assert!(!TaskError::msg("x").is_panic());
    }
}
