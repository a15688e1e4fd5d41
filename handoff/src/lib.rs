//! Concurrent result coordination for catalog writes.
//!
//! A unit of work (validate, resolve the category, persist the product) runs on a background
//! task and hands its [`concurrency::outcome::Outcome`] back through a single-use channel. The
//! same unit can run inline, on a freshly spawned task, on a bounded [`runner::pool::WorkerPool`]
//! or inside a transaction, and every shape reports the same [`error::ErrorKind`] for the same
//! fault. Every wait is bounded by a [`concurrency::cancel::CallContext`].
//!
//! The [`rendezvous`] module runs a two-party merge flow over channels with a join barrier that
//! closes both channels once both participants have finished.

pub mod catalog;
pub mod concurrency;
pub mod error;
mod macros;
pub mod rendezvous;
pub mod runner;
pub mod store;
pub mod tally;
#[cfg(feature = "test-utils")]
pub mod test_utils;
pub mod transaction;
