use config::shared::{PgConnectionConfig, RendezvousConfig, RunnerConfig};
use config::{Config, load_config};
use serde::Deserialize;

/// Configuration of the simulator binary.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulatorConfig {
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub rendezvous: RendezvousConfig,
    /// Catalog database. The simulator uses an in-memory catalog when absent.
    #[serde(default)]
    pub database: Option<PgConnectionConfig>,
    /// Categories created before any product is.
    #[serde(default)]
    pub seed_categories: Vec<String>,
    /// Actors opening a pull request, one session each. An empty actor is rejected.
    #[serde(default)]
    pub actors: Vec<String>,
}

impl SimulatorConfig {
    /// Validates every section.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.runner.validate()?;
        self.rendezvous.validate()?;
        if let Some(database) = &self.database {
            database.validate()?;
        }

        Ok(())
    }
}

impl Config for SimulatorConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &["seed_categories", "actors"];
}

/// Loads and validates the simulator configuration.
pub fn load_simulator_config() -> anyhow::Result<SimulatorConfig> {
    let config = load_config::<SimulatorConfig>()?;
    config.validate()?;

    Ok(config)
}
