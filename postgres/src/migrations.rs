use sqlx::PgPool;
use tracing::info;

/// Applies the catalog schema migrations bundled with this crate.
pub async fn migrate_catalog(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    let migrator = sqlx::migrate!("./migrations");
    migrator.run(pool).await?;

    info!("catalog migrations applied");

    Ok(())
}
