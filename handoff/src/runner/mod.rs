//! Execution of units of work on background tasks.
//!
//! A unit of work is any `FnOnce() -> Future<Output = HandoffResult<T>>`. It is only invoked on
//! the task that runs it, and exactly one [`crate::concurrency::outcome::Outcome`] is published
//! per submission, including when the unit panics. A unit whose receiver is dropped before it
//! finishes is abandoned and publishes nothing.

mod base;
pub mod pool;
pub mod single;

pub use base::execute;
pub(crate) use base::execute_into;
