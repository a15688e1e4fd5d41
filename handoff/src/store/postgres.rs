use postgres::categories::{CategoryRow, read_category_by_name};
use postgres::products::{NewProductRow, ProductRow, insert_product, read_product_by_id};
use sqlx::{PgPool, Postgres};
use tracing::debug;
use uuid::Uuid;

use crate::catalog::types::{Category, NewProduct, Product};
use crate::error::HandoffResult;
use crate::store::base::{CategoryStore, ProductStore, ProductTransaction};
use crate::transaction::{Transaction, TransactionSource};

/// Catalog stored in Postgres.
///
/// Every capability runs against the shared connection pool; transactional writes go through
/// [`PostgresTransaction`].
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store on top of an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl CategoryStore for PostgresStore {
    async fn category_by_name(&self, name: &str) -> HandoffResult<Option<Category>> {
        let row = read_category_by_name(&self.pool, name).await?;

        Ok(row.map(Category::from))
    }
}

impl ProductStore for PostgresStore {
    async fn persist_product(&self, product: NewProduct) -> HandoffResult<Product> {
        let row = insert_product(&self.pool, &NewProductRow::from(product)).await?;
        debug!(product_id = %row.id, sku = %row.sku, "product persisted");

        Ok(Product::from(row))
    }

    async fn product_by_id(&self, id: Uuid) -> HandoffResult<Option<Product>> {
        let row = read_product_by_id(&self.pool, id).await?;

        Ok(row.map(Product::from))
    }
}

impl TransactionSource for PostgresStore {
    type Tx = PostgresTransaction;

    async fn begin(&self) -> HandoffResult<PostgresTransaction> {
        let tx = self.pool.begin().await?;

        Ok(PostgresTransaction { tx })
    }
}

/// An open Postgres transaction.
///
/// Dropping it without committing rolls it back.
pub struct PostgresTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

impl ProductTransaction for PostgresTransaction {
    async fn persist_product(&mut self, product: NewProduct) -> HandoffResult<Product> {
        let row = insert_product(&mut *self.tx, &NewProductRow::from(product)).await?;
        debug!(product_id = %row.id, sku = %row.sku, "product persisted in transaction");

        Ok(Product::from(row))
    }
}

impl Transaction for PostgresTransaction {
    async fn commit(self) -> HandoffResult<()> {
        self.tx.commit().await?;

        Ok(())
    }

    async fn rollback(self) -> HandoffResult<()> {
        self.tx.rollback().await?;

        Ok(())
    }
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            sku: row.sku,
            category: row.category,
            image_url: row.image_url,
            notes: row.notes,
            price: row.price,
            stock: row.stock,
            location: row.location,
            is_available: row.is_available,
            created_at: row.created_at,
        }
    }
}

impl From<NewProduct> for NewProductRow {
    fn from(product: NewProduct) -> Self {
        Self {
            name: product.name,
            sku: product.sku,
            category: product.category,
            image_url: product.image_url,
            notes: product.notes,
            price: product.price,
            stock: product.stock,
            location: product.location,
            is_available: product.is_available,
            created_at: product.created_at,
        }
    }
}
