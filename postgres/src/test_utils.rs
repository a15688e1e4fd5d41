use config::shared::{IntoConnectOptions, PgConnectionConfig, TlsConfig};
use secrecy::SecretString;
use sqlx::{Connection, Executor, PgConnection, PgPool};
use uuid::Uuid;

/// Reads an environment variable, falling back to a default.
fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Builds a connection config for a fresh, uniquely named test database.
///
/// Connection parameters come from `TEST_DATABASE_HOST`, `TEST_DATABASE_PORT`,
/// `TEST_DATABASE_USERNAME` and `TEST_DATABASE_PASSWORD`, defaulting to a local Postgres.
///
/// # Panics
/// Panics if `TEST_DATABASE_PORT` is not a valid port number.
pub fn test_connection_config() -> PgConnectionConfig {
    let port = env_or("TEST_DATABASE_PORT", "5432")
        .parse()
        .expect("TEST_DATABASE_PORT must be a valid port");

    PgConnectionConfig {
        host: env_or("TEST_DATABASE_HOST", "localhost"),
        port,
        name: format!("handoff_test_{}", Uuid::new_v4().simple()),
        username: env_or("TEST_DATABASE_USERNAME", "postgres"),
        password: Some(SecretString::new(env_or("TEST_DATABASE_PASSWORD", "postgres"))),
        tls: TlsConfig::default(),
    }
}

/// Creates a new Postgres database and returns a connection pool to it.
///
/// # Panics
/// Panics if connection or database creation fails.
pub async fn create_pg_database(config: &PgConnectionConfig) -> PgPool {
    let mut connection = PgConnection::connect_with(&config.without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"create database "{}";"#, config.name))
        .await
        .expect("Failed to create database");

    PgPool::connect_with(config.with_db())
        .await
        .expect("Failed to connect to Postgres")
}

/// Drops a Postgres database after terminating its connections.
///
/// Failures are reported on stderr and otherwise ignored so that cleanup never fails a test.
pub async fn drop_pg_database(config: &PgConnectionConfig) {
    let mut connection = match PgConnection::connect_with(&config.without_db()).await {
        Ok(connection) => connection,
        Err(err) => {
            eprintln!("warning: failed to connect to Postgres for cleanup: {err}");
            return;
        }
    };

    if let Err(err) = connection
        .execute(&*format!(
            r#"
            select pg_terminate_backend(pg_stat_activity.pid)
            from pg_stat_activity
            where pg_stat_activity.datname = '{}'
            and pid <> pg_backend_pid();"#,
            config.name
        ))
        .await
    {
        eprintln!(
            "warning: failed to terminate connections for database {}: {err}",
            config.name
        );
    }

    if let Err(err) = connection
        .execute(&*format!(r#"drop database if exists "{}";"#, config.name))
        .await
    {
        eprintln!("warning: failed to drop database {}: {err}", config.name);
    }
}
