use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    baladias, categories, coupons, order_items, orders, product_price_tiers, products, users,
    wilayas,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Employee => "EMPLOYEE",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "EMPLOYEE" => Ok(Role::Employee),
            other => Err(format!("Invalid role: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Cancelled orders have had their stock returned and are frozen.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        *self != OrderStatus::Cancelled || next == OrderStatus::Cancelled
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == upper)
            .ok_or_else(|| format!("Invalid order status: {s}"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            role: model.role,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<categories::Model> for Category {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PriceTier {
    pub qty: i32,
    pub price: i64,
}

impl From<product_price_tiers::Model> for PriceTier {
    fn from(model: product_price_tiers::Model) -> Self {
        Self {
            qty: model.qty,
            price: model.price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub price: i64,
    pub sku: Option<String>,
    pub quantity: i32,
    pub is_activated: bool,
    pub category_id: Option<Uuid>,
    pub price_tiers: Vec<PriceTier>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn with_tiers(model: products::Model, mut price_tiers: Vec<PriceTier>) -> Self {
        price_tiers.sort_by_key(|t| t.qty);
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            image_url: model.image_url,
            price: model.price,
            sku: model.sku,
            quantity: model.quantity,
            is_activated: model.is_activated,
            category_id: model.category_id,
            price_tiers,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

/// Compact product reference embedded in orders and coupons.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductSummary {
    pub id: Uuid,
    pub title: String,
    pub image_url: Option<String>,
    pub price: i64,
}

impl From<&products::Model> for ProductSummary {
    fn from(model: &products::Model) -> Self {
        Self {
            id: model.id,
            title: model.title.clone(),
            image_url: model.image_url.clone(),
            price: model.price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Wilaya {
    pub id: Uuid,
    pub name: String,
    pub wilaya_number: i32,
    pub delivery_price: i64,
    pub home_delivery_price: Option<i64>,
    pub agency_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<wilayas::Model> for Wilaya {
    fn from(model: wilayas::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            wilaya_number: model.wilaya_number,
            delivery_price: model.delivery_price,
            home_delivery_price: model.home_delivery_price,
            agency_name: model.agency_name,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Baladia {
    pub id: Uuid,
    pub wilaya_number: i32,
    pub name: String,
    pub ar_name: Option<String>,
}

impl From<baladias::Model> for Baladia {
    fn from(model: baladias::Model) -> Self {
        Self {
            id: model.id,
            wilaya_number: model.wilaya_number,
            name: model.name,
            ar_name: model.ar_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Coupon {
    pub id: Uuid,
    pub code: String,
    pub discount: i32,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub products: Vec<ProductSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Coupon {
    pub fn with_products(model: coupons::Model, products: Vec<ProductSummary>) -> Self {
        Self {
            id: model.id,
            code: model.code,
            discount: model.discount,
            is_active: model.is_active,
            expires_at: model.expires_at.map(|dt| dt.with_timezone(&Utc)),
            products,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub phone: String,
    pub email: Option<String>,
    pub wilaya_id: Option<Uuid>,
    pub baladia: Option<String>,
    pub house: bool,
    pub status: String,
    pub subtotal: i64,
    pub discount: i64,
    pub shipping_cost: i64,
    pub total: i64,
    pub coupon_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            address: model.address,
            phone: model.phone,
            email: model.email,
            wilaya_id: model.wilaya_id,
            baladia: model.baladia,
            house: model.house,
            status: model.status,
            subtotal: model.subtotal,
            discount: model.discount,
            shipping_cost: model.shipping_cost,
            total: model.total,
            coupon_id: model.coupon_id,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product: Option<ProductSummary>,
    pub quantity: i32,
    pub price: i64,
}

impl OrderItem {
    pub fn with_product(model: order_items::Model, product: Option<ProductSummary>) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            product,
            quantity: model.quantity,
            price: model.price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_parses_case_insensitively() {
        assert_eq!("shipped".parse::<OrderStatus>(), Ok(OrderStatus::Shipped));
        assert_eq!(" Pending ".parse::<OrderStatus>(), Ok(OrderStatus::Pending));
        assert!("lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn cancelled_orders_are_frozen() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Completed));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Pending));
        assert!(OrderStatus::Cancelled.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn role_round_trips_through_its_wire_name() {
        let role: Role = "employee".parse().expect("role");
        assert_eq!(role, Role::Employee);
        assert_eq!(role.to_string(), "EMPLOYEE");
        assert!("customer".parse::<Role>().is_err());
    }
}
