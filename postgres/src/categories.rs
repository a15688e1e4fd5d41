use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

/// A row from the `categories` table.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct CategoryRow {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Reads a live category by its unique name.
///
/// Returns `None` when no category with that name exists or it was soft-deleted.
pub async fn read_category_by_name<'c, E>(
    executor: E,
    name: &str,
) -> sqlx::Result<Option<CategoryRow>>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, CategoryRow>(
        r#"
        select id, name, created_at, updated_at, deleted_at
        from categories
        where name = $1 and deleted_at is null
        limit 1
        "#,
    )
    .bind(name)
    .fetch_optional(executor)
    .await
}

/// Inserts a category, returning the existing row when the name is already taken.
pub async fn upsert_category<'c, E>(executor: E, name: &str) -> sqlx::Result<CategoryRow>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, CategoryRow>(
        r#"
        insert into categories (name)
        values ($1)
        on conflict (name) do update set name = excluded.name
        returning id, name, created_at, updated_at, deleted_at
        "#,
    )
    .bind(name)
    .fetch_one(executor)
    .await
}
