use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::{products::ProductList, settings::StorefrontContent},
    error::AppResult,
    models::Product,
    response::ApiResponse,
    routes::params::ShopQuery,
    services::{settings_service, shop_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_catalogue))
        .route("/content", get(storefront_content))
        .route("/{id}", get(catalogue_product))
}

#[utoipa::path(
    get,
    path = "/api/shop",
    params(ShopQuery),
    responses(
        (status = 200, description = "Activated products for the storefront", body = ApiResponse<ProductList>)
    ),
    tag = "Shop"
)]
pub async fn list_catalogue(
    State(state): State<AppState>,
    Query(query): Query<ShopQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = shop_service::list_catalogue(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/shop/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Activated product with price tiers", body = ApiResponse<Product>),
        (status = 404, description = "Product not found or not available")
    ),
    tag = "Shop"
)]
pub async fn catalogue_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = shop_service::catalogue_product(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/shop/content",
    responses(
        (status = 200, description = "Store name and hero section", body = ApiResponse<StorefrontContent>)
    ),
    tag = "Shop"
)]
pub async fn storefront_content(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<StorefrontContent>>> {
    let resp = settings_service::storefront_content(&state).await?;
    Ok(Json(resp))
}
