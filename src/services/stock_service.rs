use chrono::Utc;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::{
    audit,
    dto::stock::{SetStockRequest, StockItem, StockOverview, StockSummary},
    entity::products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    routes::params::{StockQuery, contains_pattern, search_term},
    state::AppState,
};

pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 5;

impl From<ProductModel> for StockItem {
    fn from(model: ProductModel) -> Self {
        Self {
            id: model.id,
            title: model.title,
            sku: model.sku,
            quantity: model.quantity,
            is_activated: model.is_activated,
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

/// In stock but at or below the threshold.
pub fn low_stock_condition(threshold: i32) -> Condition {
    Condition::all()
        .add(Column::Quantity.gt(0))
        .add(Column::Quantity.lte(threshold))
}

pub async fn stock_overview(
    state: &AppState,
    query: StockQuery,
) -> AppResult<ApiResponse<StockOverview>> {
    let (page, limit, offset) = query.pagination().normalize();
    let threshold = query
        .threshold
        .unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD)
        .max(0);

    let summary = StockSummary {
        total_products: Products::find().count(&state.orm).await? as i64,
        low_stock: Products::find()
            .filter(low_stock_condition(threshold))
            .count(&state.orm)
            .await? as i64,
        out_of_stock: Products::find()
            .filter(Column::Quantity.lte(0))
            .count(&state.orm)
            .await? as i64,
    };

    let mut finder = Products::find();
    if let Some(search) = search_term(&query.search) {
        let pattern = contains_pattern(&search);
        finder = finder.filter(
            Condition::any()
                .add(Expr::col(Column::Title).ilike(pattern.clone()))
                .add(Expr::col(Column::Sku).ilike(pattern)),
        );
    }
    let finder = finder
        .order_by_asc(Column::Quantity)
        .order_by_asc(Column::Title);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(StockItem::from)
        .collect();

    Ok(ApiResponse::success(
        "Stock",
        StockOverview { summary, items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn set_stock(
    state: &AppState,
    user: &AuthUser,
    payload: SetStockRequest,
) -> AppResult<ApiResponse<StockItem>> {
    if payload.quantity < 0 {
        return Err(AppError::BadRequest("Quantity must not be negative".into()));
    }

    let txn = state.orm.begin().await?;
    let product = Products::find_by_id(payload.id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;
    let previous = product.quantity;

    let mut active: ActiveModel = product.into();
    active.quantity = Set(payload.quantity);
    active.updated_at = Set(Utc::now().into());
    let product = active.update(&txn).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "stock_set",
        "products",
        serde_json::json!({
            "product_id": product.id,
            "from": previous,
            "to": product.quantity,
        }),
    )
    .await;
    tracing::debug!(product_id = %product.id, previous, quantity = product.quantity, "stock set");

    Ok(ApiResponse::success(
        "Stock updated successfully",
        StockItem::from(product),
        Some(Meta::empty()),
    ))
}
