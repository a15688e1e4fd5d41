use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::catalog::types::Product;

/// Message returned alongside a created product.
pub const PRODUCT_CREATED_MESSAGE: &str = "Successfully create products";

/// Identifier and creation time of a newly created product.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreated {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Response body for a successful product creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateProductResponse {
    pub message: &'static str,
    pub data: ProductCreated,
}

impl From<&Product> for CreateProductResponse {
    fn from(product: &Product) -> Self {
        Self {
            message: PRODUCT_CREATED_MESSAGE,
            data: ProductCreated {
                id: product.id,
                created_at: product.created_at,
            },
        }
    }
}
