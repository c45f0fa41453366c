//! Maybe type - a value that may or may not be present.
//!
//! [`Maybe<T>`] holds either a present value or nothing. It carries no
//! laziness and no concurrency concerns of its own; its main use in this
//! crate is to be turned into a [`TaskMonad`](crate::task::TaskMonad) through
//! [`MaybeTaskMonadExt::to_task_monad`].
//!
//! # Examples
//!
//! ```rust
//! use monadic_tasks::maybe::Maybe;
//!
//! let present = Maybe::some(42);
//! let absent: Maybe<i32> = Maybe::none();
//!
//! assert!(present.has_value());
//! assert!(!absent.has_value());
//! assert_eq!(present.value(), Some(&42));
//! assert_eq!(absent.value_or_default(), 0);
//! ```

mod bridge;

pub use bridge::MaybeTaskMonadExt;

/// A value that is either present or absent.
///
/// # Type Parameters
///
/// * `T` - The type of the present value
///
/// # Examples
///
/// ```rust
/// use monadic_tasks::maybe::Maybe;
///
/// let maybe: Maybe<String> = Some("hello".to_string()).into();
/// assert_eq!(maybe.into_option(), Some("hello".to_string()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Maybe<T> {
    content: Option<T>,
}

impl<T> Maybe<T> {
    /// Creates a `Maybe` holding `value`.
    pub const fn some(value: T) -> Self {
        Self {
            content: Some(value),
        }
    }

    /// Creates an empty `Maybe`.
    pub const fn none() -> Self {
        Self { content: None }
    }

    /// Returns `true` if a value is present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use monadic_tasks::maybe::Maybe;
    ///
    /// assert!(Maybe::some(1).has_value());
    /// assert!(!Maybe::<i32>::none().has_value());
    /// ```
    #[inline]
    pub const fn has_value(&self) -> bool {
        self.content.is_some()
    }

    /// Returns a reference to the value, or `None` when absent.
    #[inline]
    pub const fn value(&self) -> Option<&T> {
        self.content.as_ref()
    }

    /// Returns the value, or `T::default()` when absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use monadic_tasks::maybe::Maybe;
    ///
    /// assert_eq!(Maybe::some(7).value_or_default(), 7);
    /// assert_eq!(Maybe::<String>::none().value_or_default(), "");
    /// ```
    pub fn value_or_default(self) -> T
    where
        T: Default,
    {
        self.content.unwrap_or_default()
    }

    /// Converts into the equivalent `Option`.
    pub fn into_option(self) -> Option<T> {
        self.content
    }
}

impl<T> Default for Maybe<T> {
    fn default() -> Self {
        Self::none()
    }
}

impl<T> From<Option<T>> for Maybe<T> {
    fn from(content: Option<T>) -> Self {
        Self { content }
    }
}

impl<T> From<Maybe<T>> for Option<T> {
    fn from(maybe: Maybe<T>) -> Self {
        maybe.content
    }
}
