use std::collections::HashMap;

use sea_orm::{EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};

use crate::{
    dto::{
        dashboard::{DashboardStats, StatusCount},
        stock::StockItem,
    },
    entity::{
        orders::{Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products},
    },
    error::AppResult,
    models::{Order, OrderStatus},
    response::{ApiResponse, Meta},
    services::stock_service::{DEFAULT_LOW_STOCK_THRESHOLD, low_stock_condition},
    state::AppState,
};

const RECENT_LIMIT: u64 = 5;

pub async fn dashboard(state: &AppState) -> AppResult<ApiResponse<DashboardStats>> {
    let total_orders = Orders::find().count(&state.orm).await? as i64;
    let total_products = Products::find().count(&state.orm).await? as i64;

    let (units_in_stock,): (i64,) =
        sqlx::query_as("SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM products")
            .fetch_one(&state.pool)
            .await?;
    let (revenue,): (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(total), 0)::BIGINT FROM orders WHERE status <> $1",
    )
    .bind(OrderStatus::Cancelled.as_str())
    .fetch_one(&state.pool)
    .await?;

    let counted: Vec<(String, i64)> =
        sqlx::query_as("SELECT status, COUNT(*) FROM orders GROUP BY status")
            .fetch_all(&state.pool)
            .await?;
    let orders_by_status = status_breakdown(counted);

    let recent_orders = Orders::find()
        .order_by_desc(OrderCol::CreatedAt)
        .limit(RECENT_LIMIT)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let low_stock = Products::find()
        .filter(low_stock_condition(DEFAULT_LOW_STOCK_THRESHOLD))
        .order_by_asc(ProdCol::Quantity)
        .limit(RECENT_LIMIT)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(StockItem::from)
        .collect();

    Ok(ApiResponse::success(
        "Dashboard",
        DashboardStats {
            total_orders,
            total_products,
            units_in_stock,
            revenue,
            orders_by_status,
            recent_orders,
            low_stock,
        },
        Some(Meta::empty()),
    ))
}

/// One entry per known status, zero-filled, in lifecycle order.
fn status_breakdown(counted: Vec<(String, i64)>) -> Vec<StatusCount> {
    let counts: HashMap<String, i64> = counted.into_iter().collect();
    OrderStatus::ALL
        .iter()
        .map(|status| StatusCount {
            status: status.as_str().to_string(),
            count: counts.get(status.as_str()).copied().unwrap_or(0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_statuses_count_as_zero() {
        let breakdown = status_breakdown(vec![
            ("SHIPPED".to_string(), 4),
            ("PENDING".to_string(), 2),
        ]);
        let counts: Vec<(&str, i64)> = breakdown
            .iter()
            .map(|s| (s.status.as_str(), s.count))
            .collect();
        assert_eq!(
            counts,
            vec![
                ("PENDING", 2),
                ("PROCESSING", 0),
                ("SHIPPED", 4),
                ("COMPLETED", 0),
                ("CANCELLED", 0),
            ]
        );
    }
}
