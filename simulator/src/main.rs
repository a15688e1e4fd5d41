//! Simulator binary.
//!
//! Runs one pull request / merge rendezvous session per configured actor and creates a product
//! through every call shape against an in-memory or Postgres catalog.

use ::config::Environment;
use telemetry::tracing::init_tracing;
use tracing::error;

use crate::config::load_simulator_config;
use crate::core::start_simulator;

mod config;
mod core;

fn main() -> anyhow::Result<()> {
    let environment = Environment::load()?;
    init_tracing(env!("CARGO_BIN_NAME"), environment)?;

    let simulator_config = load_simulator_config()?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async {
            if let Err(err) = start_simulator(simulator_config).await {
                error!("{err:#}");
                return Err(err);
            }

            Ok(())
        })
}
