use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::stock::{SetStockRequest, StockItem, StockOverview},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::StockQuery,
    services::stock_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(stock_overview).post(set_stock))
}

#[utoipa::path(
    get,
    path = "/api/main/stock",
    params(StockQuery),
    responses(
        (status = 200, description = "Stock levels with low/out-of-stock summary", body = ApiResponse<StockOverview>),
        (status = 403, description = "Staff token required")
    ),
    security(("bearer_auth" = [])),
    tag = "Stock"
)]
pub async fn stock_overview(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<StockQuery>,
) -> AppResult<Json<ApiResponse<StockOverview>>> {
    let resp = stock_service::stock_overview(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/main/stock",
    request_body = SetStockRequest,
    responses(
        (status = 200, description = "Set a product's quantity", body = ApiResponse<StockItem>),
        (status = 400, description = "Negative quantity"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Stock"
)]
pub async fn set_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<SetStockRequest>,
) -> AppResult<Json<ApiResponse<StockItem>>> {
    let resp = stock_service::set_stock(&state, &user, payload).await?;
    Ok(Json(resp))
}
