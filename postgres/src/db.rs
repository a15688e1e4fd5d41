use config::shared::{IntoConnectOptions, PgConnectionConfig};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::time::Duration;
use tracing::info;

/// Time allowed to acquire a connection before a query fails with a pool timeout.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Duration after which idle connections are closed.
const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Connects to the catalog database and verifies reachability.
///
/// The pool is shared by every concurrent unit of work, so `max_connections` bounds how many
/// lookups and inserts can hit the database at the same time.
pub async fn connect_to_catalog_database(
    config: &PgConnectionConfig,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    let options: PgConnectOptions = config.with_db();

    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(max_connections.max(1))
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .idle_timeout(Some(IDLE_TIMEOUT))
        .connect_with(options)
        .await?;

    sqlx::query("select 1").execute(&pool).await?;

    info!(
        host = %config.host,
        database = %config.name,
        max_connections,
        "connected to catalog database"
    );

    Ok(pool)
}
