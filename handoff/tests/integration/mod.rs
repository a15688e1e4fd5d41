#![cfg(feature = "test-utils")]

mod call_shapes;
mod cancellation;
mod pool;
mod rendezvous;
mod tally;
mod transaction;
