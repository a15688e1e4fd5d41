//! Helpers shared by unit and integration tests.

pub mod fixtures;
pub mod store;
pub mod transaction;
