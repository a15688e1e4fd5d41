//! Tracing setup shared by the handoff binaries and tests.

pub mod tracing;
