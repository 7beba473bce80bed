//! Catalog models stored in tenant databases. Nothing in this module ever
//! touches the shared database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: f64,
    pub cost_price: Option<f64>,
    pub sku: Option<String>,
    pub quantity: i64,
    pub status: ProductStatus,
    pub is_featured: bool,
    /// User id from the shared database; intentionally not a foreign key,
    /// tenant databases hold no cross-database relations.
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema, Default)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    #[default]
    Draft,
    Active,
    Inactive,
    Archived,
}

impl Product {
    pub fn new(name: String, slug: String, created_by: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            slug,
            description: None,
            price: 0.0,
            cost_price: None,
            sku: None,
            quantity: 0,
            status: ProductStatus::Draft,
            is_featured: false,
            created_by,
            updated_by: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ProductImage {
    pub id: String,
    pub product_id: String,
    /// Storage path or URL; the bytes themselves live outside the database.
    pub image: String,
    pub alt_text: Option<String>,
    pub is_primary: bool,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
}

impl ProductImage {
    pub fn new(product_id: String, image: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            product_id,
            image,
            alt_text: None,
            is_primary: false,
            sort_order: 0,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    #[serde(default)]
    pub cost_price: Option<f64>,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub sku: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub status: Option<ProductStatus>,
    #[serde(default)]
    pub is_featured: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    #[serde(default)]
    pub cost_price: Option<f64>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub status: Option<ProductStatus>,
    #[serde(default)]
    pub is_featured: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductImageRequest {
    #[validate(length(min = 1, max = 255))]
    pub image: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub is_primary: Option<bool>,
    #[serde(default)]
    pub sort_order: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDetailResponse {
    #[serde(flatten)]
    pub product: Product,
    pub images: Vec<ProductImage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_product_defaults_to_draft() {
        let product = Product::new("Widget".into(), "widget".into(), Some("u1".into()));
        assert_eq!(product.status, ProductStatus::Draft);
        assert_eq!(product.quantity, 0);
        assert!(!product.is_featured);
    }

    #[test]
    fn product_status_serializes_snake_case() {
        let value = serde_json::to_value(ProductStatus::Archived).unwrap();
        assert_eq!(value, serde_json::Value::String("archived".into()));
        let parsed: ProductStatus = serde_json::from_str("\"active\"").unwrap();
        assert_eq!(parsed, ProductStatus::Active);
    }
}
