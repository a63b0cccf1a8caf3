use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct StockItem {
    pub id: Uuid,
    pub title: String,
    pub sku: Option<String>,
    pub quantity: i32,
    pub is_activated: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StockSummary {
    pub total_products: i64,
    pub low_stock: i64,
    pub out_of_stock: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StockOverview {
    pub summary: StockSummary,
    pub items: Vec<StockItem>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetStockRequest {
    pub id: Uuid,
    pub quantity: i32,
}
