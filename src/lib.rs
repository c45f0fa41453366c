//! # monadic-tasks
//!
//! Lazily composed asynchronous computations and optional values, as monads.
//!
//! ## Overview
//!
//! - **`TaskMonad`**: a deferred, tree-structured asynchronous computation.
//!   Combinators (`unit`, `bind`, `map`, `perform_side_effect_async`,
//!   `fail`) build new handles without running anything; `get_result` runs
//!   the whole chain, every time it is called.
//! - **`Maybe`**: a present/absent value holder that can be bridged into a
//!   `TaskMonad` which yields the value or fails.
//!
//! ## Feature Flags
//!
//! - `maybe`: The `Maybe` type and its bridge to `TaskMonad` (default)
//! - `full`: Enable all features
//!
//! ## Example
//!
//! ```rust
//! use monadic_tasks::prelude::*;
//!
//! # futures::executor::block_on(async {
//! let chain = Maybe::some(10)
//!     .to_task_monad()
//!     .map(|x| x * 2)
//!     .bind(|x| TaskMonad::unit(x + 1));
//!
//! assert_eq!(chain.get_result().await.unwrap(), 21);
//! # });
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types and traits.
///
/// # Usage
///
/// ```rust
/// use monadic_tasks::prelude::*;
/// ```
pub mod prelude {
    pub use crate::task::*;

    #[cfg(feature = "maybe")]
    pub use crate::maybe::*;
}

pub mod task;

#[cfg(feature = "maybe")]
pub mod maybe;
