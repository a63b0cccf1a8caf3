use serde::Serialize;
use utoipa::ToSchema;

use crate::models::Order;

use super::stock::StockItem;

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_orders: i64,
    pub total_products: i64,
    pub units_in_stock: i64,
    pub revenue: i64,
    pub orders_by_status: Vec<StatusCount>,
    pub recent_orders: Vec<Order>,
    pub low_stock: Vec<StockItem>,
}
