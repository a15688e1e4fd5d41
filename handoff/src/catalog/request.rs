use serde::Deserialize;

use crate::bail;
use crate::error::{ErrorKind, HandoffResult};

/// Image formats accepted for product images.
pub const IMAGE_FORMATS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp"];

const MAX_NAME_LEN: usize = 30;
const MAX_SKU_LEN: usize = 30;
const MAX_NOTES_LEN: usize = 200;
const MIN_PRICE: f64 = 1.0;
const MAX_STOCK: i32 = 100_000;

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreateRequest {
    pub name: String,
    pub sku: String,
    /// Name of the category the product belongs to. Must exist.
    pub category: String,
    pub image_url: String,
    pub notes: String,
    pub price: f64,
    pub stock: i32,
    pub location: String,
    pub is_available: bool,
}

impl ProductCreateRequest {
    /// Checks the request before any lookup or write happens.
    ///
    /// Fails with [`ErrorKind::InvalidData`] naming the first offending field.
    pub fn validate(&self) -> HandoffResult<()> {
        check_length("name", &self.name, MAX_NAME_LEN)?;
        check_length("sku", &self.sku, MAX_SKU_LEN)?;
        check_length("notes", &self.notes, MAX_NOTES_LEN)?;

        if self.location.is_empty() {
            bail!(
                ErrorKind::InvalidData,
                "Invalid product request",
                "location must not be empty"
            );
        }

        if !self.price.is_finite() || self.price < MIN_PRICE {
            bail!(
                ErrorKind::InvalidData,
                "Invalid product request",
                format!("price must be at least {MIN_PRICE}, got {}", self.price)
            );
        }

        if !(0..=MAX_STOCK).contains(&self.stock) {
            bail!(
                ErrorKind::InvalidData,
                "Invalid product request",
                format!("stock must be between 0 and {MAX_STOCK}, got {}", self.stock)
            );
        }

        if !IMAGE_FORMATS
            .iter()
            .any(|format| self.image_url.ends_with(format))
        {
            bail!(
                ErrorKind::InvalidData,
                "Invalid product request",
                format!(
                    "image url `{}` must end with one of {}",
                    self.image_url,
                    IMAGE_FORMATS.join(", ")
                )
            );
        }

        Ok(())
    }
}

fn check_length(field: &str, value: &str, max: usize) -> HandoffResult<()> {
    let len = value.chars().count();
    if len == 0 || len > max {
        bail!(
            ErrorKind::InvalidData,
            "Invalid product request",
            format!("{field} must be between 1 and {max} characters, got {len}")
        );
    }

    Ok(())
}
