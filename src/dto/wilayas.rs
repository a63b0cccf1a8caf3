use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Baladia, Wilaya};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateWilayaRequest {
    pub name: Option<String>,
    pub wilaya_number: Option<i32>,
    pub delivery_price: Option<i64>,
    pub home_delivery_price: Option<i64>,
    pub agency_name: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateWilayaRequest {
    pub name: Option<String>,
    pub wilaya_number: Option<i32>,
    pub delivery_price: Option<i64>,
    #[serde(default, deserialize_with = "super::explicit_null")]
    #[schema(value_type = Option<i64>)]
    pub home_delivery_price: Option<Option<i64>>,
    pub agency_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct WilayaList {
    #[schema(value_type = Vec<Wilaya>)]
    pub items: Vec<Wilaya>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BaladiaImport {
    pub wilaya_number: i32,
    pub name: String,
    pub ar_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BaladiaImportResult {
    pub received: usize,
    pub inserted: u64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct BaladiaList {
    #[schema(value_type = Vec<Baladia>)]
    pub items: Vec<Baladia>,
}
