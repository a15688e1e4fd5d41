use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::request::ProductCreateRequest;

/// A product category. Products reference it by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A product that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
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

impl NewProduct {
    /// Builds the record to persist from a validated request and the category it resolved to.
    ///
    /// The stored category name is the resolved one, not the raw request field.
    pub fn from_request(
        request: &ProductCreateRequest,
        category: &Category,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: request.name.clone(),
            sku: request.sku.clone(),
            category: category.name.clone(),
            image_url: request.image_url.clone(),
            notes: request.notes.clone(),
            price: request.price,
            stock: request.stock,
            location: request.location.clone(),
            is_available: request.is_available,
            created_at,
        }
    }

    /// Attaches a generated identifier, producing the persisted form.
    pub fn into_product(self, id: Uuid) -> Product {
        Product {
            id,
            name: self.name,
            sku: self.sku,
            category: self.category,
            image_url: self.image_url,
            notes: self.notes,
            price: self.price,
            stock: self.stock,
            location: self.location,
            is_available: self.is_available,
            created_at: self.created_at,
        }
    }
}

/// A persisted product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
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

impl Product {
    /// Returns `true` when both records carry the same fields, ignoring generated identifiers and
    /// timestamps.
    pub fn same_fields(&self, other: &Product) -> bool {
        self.name == other.name
            && self.sku == other.sku
            && self.category == other.category
            && self.image_url == other.image_url
            && self.notes == other.notes
            && self.price == other.price
            && self.stock == other.stock
            && self.location == other.location
            && self.is_available == other.is_available
    }
}
