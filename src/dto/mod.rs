pub mod auth;
pub mod categories;
pub mod coupons;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod settings;
pub mod stock;
pub mod users;
pub mod wilayas;

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field (`None`).
pub fn explicit_null<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Deleted {
    pub id: Uuid,
}
