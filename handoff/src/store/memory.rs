use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::catalog::types::{Category, NewProduct, Product};
use crate::error::{ErrorKind, HandoffError, HandoffResult};
use crate::handoff_error;
use crate::store::base::{CategoryStore, ProductStore, ProductTransaction};
use crate::transaction::{Transaction, TransactionSource};

/// Inner state of [`MemoryStore`].
#[derive(Debug, Default)]
struct Inner {
    /// Categories indexed by name.
    categories: HashMap<String, Category>,
    /// Committed products indexed by id.
    products: HashMap<Uuid, Product>,
}

impl Inner {
    fn sku_taken(&self, sku: &str) -> bool {
        self.products.values().any(|product| product.sku == sku)
    }
}

/// In-memory catalog implementing every store capability.
///
/// Transactions stage their writes privately and apply them in one step on commit, so readers
/// never see a partial transaction.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding one category per name.
    pub async fn with_categories<I, N>(names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        let store = Self::new();
        for name in names {
            store.add_category(name).await;
        }

        store
    }

    /// Adds a category, returning the existing one when the name is taken.
    pub async fn add_category(&self, name: impl Into<String>) -> Category {
        let name = name.into();
        let mut inner = self.inner.lock().await;

        inner
            .categories
            .entry(name.clone())
            .or_insert_with(|| Category {
                id: Uuid::new_v4(),
                name,
                created_at: Utc::now(),
            })
            .clone()
    }

    /// Returns every committed product.
    pub async fn products(&self) -> Vec<Product> {
        let inner = self.inner.lock().await;

        inner.products.values().cloned().collect()
    }

    /// Returns the number of committed products.
    pub async fn product_count(&self) -> usize {
        self.inner.lock().await.products.len()
    }
}

impl CategoryStore for MemoryStore {
    async fn category_by_name(&self, name: &str) -> HandoffResult<Option<Category>> {
        let inner = self.inner.lock().await;

        Ok(inner.categories.get(name).cloned())
    }
}

impl ProductStore for MemoryStore {
    async fn persist_product(&self, product: NewProduct) -> HandoffResult<Product> {
        let mut inner = self.inner.lock().await;

        if inner.sku_taken(&product.sku) {
            return Err(duplicate_sku_error(&product.sku));
        }

        let product = product.into_product(Uuid::new_v4());
        inner.products.insert(product.id, product.clone());
        debug!(product_id = %product.id, sku = %product.sku, "product persisted in memory");

        Ok(product)
    }

    async fn product_by_id(&self, id: Uuid) -> HandoffResult<Option<Product>> {
        let inner = self.inner.lock().await;

        Ok(inner.products.get(&id).cloned())
    }
}

impl TransactionSource for MemoryStore {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> HandoffResult<MemoryTransaction> {
        Ok(MemoryTransaction {
            store: self.clone(),
            staged: Vec::new(),
        })
    }
}

/// Transaction over a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryTransaction {
    store: MemoryStore,
    staged: Vec<Product>,
}

impl ProductTransaction for MemoryTransaction {
    async fn persist_product(&mut self, product: NewProduct) -> HandoffResult<Product> {
        let staged_conflict = self.staged.iter().any(|staged| staged.sku == product.sku);
        if staged_conflict || self.store.inner.lock().await.sku_taken(&product.sku) {
            return Err(duplicate_sku_error(&product.sku));
        }

        let product = product.into_product(Uuid::new_v4());
        self.staged.push(product.clone());

        Ok(product)
    }
}

impl Transaction for MemoryTransaction {
    async fn commit(self) -> HandoffResult<()> {
        let mut inner = self.store.inner.lock().await;

        // Another transaction may have committed the same sku since it was staged.
        if let Some(product) = self.staged.iter().find(|product| inner.sku_taken(&product.sku)) {
            return Err(duplicate_sku_error(&product.sku));
        }

        let count = self.staged.len();
        for product in self.staged {
            inner.products.insert(product.id, product);
        }
        debug!(count, "memory transaction committed");

        Ok(())
    }

    async fn rollback(self) -> HandoffResult<()> {
        debug!(discarded = self.staged.len(), "memory transaction rolled back");

        Ok(())
    }
}

fn duplicate_sku_error(sku: &str) -> HandoffError {
    handoff_error!(
        ErrorKind::Conflict,
        "Product sku already exists",
        sku.to_string()
    )
}
