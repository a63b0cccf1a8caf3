use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{PriceTier, Product};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub image_url: Option<String>,
    pub price: i64,
    pub sku: Option<String>,
    #[serde(default)]
    pub quantity: i32,
    pub category_id: Option<Uuid>,
    pub is_activated: Option<bool>,
    #[serde(default)]
    pub price_tiers: Vec<PriceTier>,
}

/// Empty strings for `sku` and `image_url` clear them; `price_tiers`
/// replaces the whole tier set when present.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<i64>,
    pub sku: Option<String>,
    pub quantity: Option<i32>,
    #[serde(default, deserialize_with = "super::explicit_null")]
    #[schema(value_type = Option<Uuid>)]
    pub category_id: Option<Option<Uuid>>,
    pub is_activated: Option<bool>,
    pub price_tiers: Option<Vec<PriceTier>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}
