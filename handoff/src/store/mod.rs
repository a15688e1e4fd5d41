//! Category lookup and product persistence capabilities, with in-memory and Postgres backends.

pub mod base;
pub mod memory;
pub mod postgres;
