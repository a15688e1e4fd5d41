//! Postgres access for categories and products.
//!
//! Queries are plain functions generic over [`sqlx::PgExecutor`], so the same function runs
//! against a pool or inside an open transaction.

pub mod categories;
pub mod db;
pub mod errors;
pub mod migrations;
pub mod products;
#[cfg(feature = "test-utils")]
pub mod test_utils;
