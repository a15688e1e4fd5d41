//! Shared configuration types for handoff services.

mod base;
mod connection;
mod rendezvous;
mod runner;

pub use base::ValidationError;
pub use connection::{IntoConnectOptions, PgConnectionConfig, TlsConfig};
pub use rendezvous::RendezvousConfig;
pub use runner::RunnerConfig;
