use crate::catalog::request::ProductCreateRequest;

/// Category seeded by tests that expect lookups to succeed.
pub const TEST_CATEGORY: &str = "lighting";

/// Category no test store ever holds.
pub const MISSING_CATEGORY: &str = "garden";

/// Returns a valid request for `sku` in `category`.
pub fn product_request(sku: &str, category: &str) -> ProductCreateRequest {
    ProductCreateRequest {
        name: format!("Desk lamp {sku}"),
        sku: sku.to_string(),
        category: category.to_string(),
        image_url: format!("https://cdn.example.com/{sku}.png"),
        notes: "Warm white, dimmable".to_string(),
        price: 25.0,
        stock: 12,
        location: "Aisle 4".to_string(),
        is_available: true,
    }
}

/// Returns `count` valid requests with distinct skus in `category`.
pub fn product_requests(count: usize, category: &str) -> Vec<ProductCreateRequest> {
    (0..count)
        .map(|i| product_request(&format!("SKU-{i:04}"), category))
        .collect()
}

/// Returns a request that fails validation.
pub fn invalid_product_request() -> ProductCreateRequest {
    ProductCreateRequest {
        price: 0.5,
        ..product_request("INVALID", TEST_CATEGORY)
    }
}
