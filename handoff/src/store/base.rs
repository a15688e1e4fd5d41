use std::future::Future;

use uuid::Uuid;

use crate::catalog::types::{Category, NewProduct, Product};
use crate::error::HandoffResult;
use crate::transaction::Transaction;

/// Resolves categories by name.
///
/// Implementations must be safe to call from many tasks at once.
pub trait CategoryStore: Send + Sync {
    /// Returns the category named `name`, or `None` when it does not exist.
    ///
    /// Transient backend failures are reported as [`crate::error::ErrorKind::Unavailable`].
    fn category_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = HandoffResult<Option<Category>>> + Send;
}

/// Persists and reads products.
///
/// Implementations must be safe to call from many tasks at once.
pub trait ProductStore: Send + Sync {
    /// Stores `product` and returns it with its generated identifier.
    ///
    /// A duplicated sku fails with [`crate::error::ErrorKind::Conflict`]; every other failure is
    /// [`crate::error::ErrorKind::Unavailable`]. The record is visible to readers once this
    /// returns.
    fn persist_product(
        &self,
        product: NewProduct,
    ) -> impl Future<Output = HandoffResult<Product>> + Send;

    /// Returns the product with the given id, or `None` when it does not exist.
    fn product_by_id(&self, id: Uuid) -> impl Future<Output = HandoffResult<Option<Product>>> + Send;
}

/// A transaction that products can be written through.
///
/// Writes only become visible to other readers once the transaction commits.
pub trait ProductTransaction: Transaction {
    /// Stores `product` inside the transaction, with the same failure kinds as
    /// [`ProductStore::persist_product`].
    fn persist_product(
        &mut self,
        product: NewProduct,
    ) -> impl Future<Output = HandoffResult<Product>> + Send;
}
