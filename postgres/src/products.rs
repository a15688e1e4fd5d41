use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

/// A row from the `products` table.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub sku: String,
    pub category: String,
    pub image_url: String,
    pub notes: String,
    pub price: f64,
    pub stock: i32,
    pub location: String,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

/// Column values for a product that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProductRow {
    pub name: String,
    pub sku: String,
    pub category: String,
    pub image_url: String,
    pub notes: String,
    pub price: f64,
    pub stock: i32,
    pub location: String,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

/// Inserts a product and returns the stored row including its generated id.
///
/// A duplicated `sku` fails with a unique violation, see [`crate::errors::is_unique_violation`].
pub async fn insert_product<'c, E>(executor: E, product: &NewProductRow) -> sqlx::Result<ProductRow>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, ProductRow>(
        r#"
        insert into products
            (name, sku, category, image_url, notes, price, stock, location, is_available, created_at)
        values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        returning id, name, sku, category, image_url, notes, price, stock, location, is_available, created_at
        "#,
    )
    .bind(&product.name)
    .bind(&product.sku)
    .bind(&product.category)
    .bind(&product.image_url)
    .bind(&product.notes)
    .bind(product.price)
    .bind(product.stock)
    .bind(&product.location)
    .bind(product.is_available)
    .bind(product.created_at)
    .fetch_one(executor)
    .await
}

/// Reads a live product by id.
pub async fn read_product_by_id<'c, E>(executor: E, id: Uuid) -> sqlx::Result<Option<ProductRow>>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, ProductRow>(
        r#"
        select id, name, sku, category, image_url, notes, price, stock, location, is_available, created_at
        from products
        where id = $1 and deleted_at is null
        limit 1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Reads a live product by its unique sku.
///
/// Lets callers check whether a write became visible without knowing the generated id.
pub async fn read_product_by_sku<'c, E>(executor: E, sku: &str) -> sqlx::Result<Option<ProductRow>>
where
    E: PgExecutor<'c>,
{
    sqlx::query_as::<_, ProductRow>(
        r#"
        select id, name, sku, category, image_url, notes, price, stock, location, is_available, created_at
        from products
        where sku = $1 and deleted_at is null
        limit 1
        "#,
    )
    .bind(sku)
    .fetch_optional(executor)
    .await
}
