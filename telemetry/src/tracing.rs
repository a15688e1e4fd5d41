use config::Environment;
use std::sync::Once;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable read for a custom filter directive.
const RUST_LOG_ENV_NAME: &str = "RUST_LOG";

/// Guards test tracing so that it is installed at most once per test binary.
static INIT_TEST_TRACING: Once = Once::new();

/// Errors raised while installing the global tracing subscriber.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to install the global tracing subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Builds the default filter for a binary when `RUST_LOG` is not set.
fn default_filter(app_name: &str) -> EnvFilter {
    EnvFilter::new(format!("{app_name}=info,handoff=info,postgres=info"))
}

/// Installs the global tracing subscriber for a binary.
///
/// The filter is taken from `RUST_LOG` when present, otherwise it logs `info` and above for the
/// binary and the workspace crates. Production emits JSON lines; other environments emit
/// human-readable output.
pub fn init_tracing(app_name: &str, environment: Environment) -> Result<(), TracingError> {
    let filter = match std::env::var(RUST_LOG_ENV_NAME) {
        Ok(directives) => EnvFilter::new(directives),
        Err(_) => default_filter(app_name),
    };

    let registry = tracing_subscriber::registry().with(filter);

    if environment.is_production() {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init()?;
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()?;
    }

    ::tracing::info!(app_name, %environment, "tracing initialized");

    Ok(())
}

/// Installs a test-friendly subscriber once per process.
///
/// Output goes through the test writer so that it is captured per test. Set `RUST_LOG` to
/// change the verbosity; failures to install (for example because another subscriber won the race)
/// are ignored.
pub fn init_test_tracing() {
    INIT_TEST_TRACING.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("handoff=debug"));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_test_writer())
            .try_init();
    });
}
