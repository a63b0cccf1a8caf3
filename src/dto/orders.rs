use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, OrderItem, Wilaya};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OrderLineRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub phone: String,
    pub email: Option<String>,
    pub wilaya_id: Option<Uuid>,
    pub baladia: Option<String>,
    #[serde(default)]
    pub house: bool,
    pub coupon_code: Option<String>,
    pub items: Vec<OrderLineRequest>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateOrderRequest {
    pub status: Option<String>,
    pub wilaya_id: Option<Uuid>,
    pub baladia: Option<String>,
    pub house: Option<bool>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

impl UpdateOrderRequest {
    pub fn touches_shipping(&self) -> bool {
        self.wilaya_id.is_some() || self.baladia.is_some() || self.house.is_some()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub wilaya: Option<Wilaya>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct OrderList {
    #[schema(value_type = Vec<OrderDetail>)]
    pub items: Vec<OrderDetail>,
}
