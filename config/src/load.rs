use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::environment::Environment;

const CONFIGURATION_DIR: &str = "configuration";

const ENV_PREFIX: &str = "APP";

/// Separator for nested keys, as in `APP_RUNNER__POOL_SIZE`.
const ENV_SEPARATOR: &str = "__";

const LIST_SEPARATOR: &str = ",";

/// Implemented by top-level configuration structures.
pub trait Config {
    /// Keys whose environment variable values are split into lists on commas.
    const LIST_PARSE_KEYS: &'static [&'static str];
}

#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("failed to determine the current directory: {0}")]
    CurrentDir(#[source] io::Error),

    #[error("configuration directory `{0}` does not exist")]
    MissingDirectory(PathBuf),

    #[error("failed to determine runtime environment: {0}")]
    Environment(#[from] io::Error),

    #[error("failed to load configuration from `{directory}`: {source}")]
    Load {
        directory: PathBuf,
        source: rust_cli_config::ConfigError,
    },
}

/// Loads configuration from `./configuration` for the environment named by `APP_ENVIRONMENT`.
///
/// Sources are layered: `base`, then the environment file (`dev`, `staging` or `prod`, each as
/// yaml or json), then `APP_`-prefixed environment variables.
pub fn load_config<T>() -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    let working_dir = std::env::current_dir().map_err(LoadConfigError::CurrentDir)?;
    let environment = Environment::load()?;

    load_config_from(&working_dir.join(CONFIGURATION_DIR), environment)
}

/// Loads configuration from `directory` for an explicit `environment`.
pub fn load_config_from<T>(directory: &Path, environment: Environment) -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    if !directory.is_dir() {
        return Err(LoadConfigError::MissingDirectory(directory.to_path_buf()));
    }

    let mut overrides = rust_cli_config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator(ENV_SEPARATOR);
    if !T::LIST_PARSE_KEYS.is_empty() {
        overrides = overrides.try_parsing(true).list_separator(LIST_SEPARATOR);
        for key in T::LIST_PARSE_KEYS {
            overrides = overrides.with_list_parse_key(key);
        }
    }

    // Files are named without an extension so every enabled format is tried.
    rust_cli_config::Config::builder()
        .add_source(rust_cli_config::File::from(directory.join("base")))
        .add_source(rust_cli_config::File::from(
            directory.join(environment.as_str()),
        ))
        .add_source(overrides)
        .build()
        .and_then(|settings| settings.try_deserialize())
        .map_err(|source| LoadConfigError::Load {
            directory: directory.to_path_buf(),
            source,
        })
}
