use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::{
    dto::products::ProductList,
    entity::products::{Column, Entity as Products},
    error::{AppError, AppResult},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{ShopQuery, ShopSort, contains_pattern, search_term},
    services::product_service::{attach_tiers, load_product},
    state::AppState,
};

/// Catalogue visible to customers: activated products only.
pub async fn list_catalogue(
    state: &AppState,
    query: ShopQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(Column::IsActivated.eq(true));
    if let Some(search) = search_term(&query.search) {
        let pattern = contains_pattern(&search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Title).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }
    if let Some(category_id) = query.category_id {
        condition = condition.add(Column::CategoryId.eq(category_id));
    }

    let finder = Products::find().filter(condition);
    let finder = match query.sort.unwrap_or_default() {
        ShopSort::Newest => finder.order_by_desc(Column::CreatedAt),
        ShopSort::PriceAsc => finder.order_by_asc(Column::Price),
        ShopSort::PriceDesc => finder.order_by_desc(Column::Price),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = attach_tiers(&state.orm, models).await?;

    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn catalogue_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let model = Products::find_by_id(id)
        .filter(Column::IsActivated.eq(true))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;
    let product = load_product(&state.orm, model).await?;
    Ok(ApiResponse::success("Product", product, None))
}
