use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        Deleted,
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
    },
    entity::{
        categories::Entity as Categories,
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        product_price_tiers::{
            ActiveModel as TierActive, Column as TierCol, Entity as ProductPriceTiers,
        },
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{PriceTier, Product},
    response::{ApiResponse, Meta},
    routes::params::{ProductListQuery, contains_pattern, search_term},
    services::pricing::validate_tiers,
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    query: ProductListQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = search_term(&query.search) {
        let pattern = contains_pattern(&search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Title).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern.clone()))
                .add(Expr::col(Column::Sku).ilike(pattern)),
        );
    }
    if let Some(category_id) = query.category_id {
        condition = condition.add(Column::CategoryId.eq(category_id));
    }
    if let Some(is_activated) = query.is_activated {
        condition = condition.add(Column::IsActivated.eq(is_activated));
    }

    let finder = Products::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = attach_tiers(&state.orm, models).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;
    let product = load_product(&state.orm, product).await?;
    Ok(ApiResponse::success("Product", product, None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let title = required_text(&payload.title, "Title")?;
    validate_amounts(Some(payload.price), Some(payload.quantity))?;
    validate_tiers(&payload.price_tiers).map_err(AppError::BadRequest)?;
    if let Some(category_id) = payload.category_id {
        ensure_category_exists(state, category_id).await?;
    }
    let sku = non_blank(payload.sku);
    if let Some(sku) = sku.as_deref() {
        ensure_sku_free(state, sku, None).await?;
    }

    let txn = state.orm.begin().await?;
    let now = Utc::now();
    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(title),
        description: Set(payload.description.trim().to_string()),
        image_url: Set(non_blank(payload.image_url)),
        price: Set(payload.price),
        sku: Set(sku),
        quantity: Set(payload.quantity),
        is_activated: Set(payload.is_activated.unwrap_or(true)),
        category_id: Set(payload.category_id),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;
    replace_tiers(&txn, product.id, &payload.price_tiers).await?;
    let product = load_product(&txn, product).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created successfully",
        product,
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    validate_amounts(payload.price, payload.quantity)?;
    if let Some(tiers) = payload.price_tiers.as_deref() {
        validate_tiers(tiers).map_err(AppError::BadRequest)?;
    }
    if let Some(Some(category_id)) = payload.category_id {
        ensure_category_exists(state, category_id).await?;
    }

    let txn = state.orm.begin().await?;
    let existing = Products::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    let mut active: ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(required_text(&title, "Title")?);
    }
    if let Some(description) = payload.description {
        active.description = Set(description.trim().to_string());
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(non_blank(Some(image_url)));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(sku) = payload.sku {
        let sku = non_blank(Some(sku));
        if let Some(sku) = sku.as_deref() {
            ensure_sku_free(state, sku, Some(id)).await?;
        }
        active.sku = Set(sku);
    }
    if let Some(quantity) = payload.quantity {
        active.quantity = Set(quantity);
    }
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(category_id);
    }
    if let Some(is_activated) = payload.is_activated {
        active.is_activated = Set(is_activated);
    }
    active.updated_at = Set(Utc::now().into());
    let product = active.update(&txn).await?;

    if let Some(tiers) = payload.price_tiers.as_deref() {
        replace_tiers(&txn, product.id, tiers).await?;
    }
    let product = load_product(&txn, product).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product updated successfully",
        product,
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Deleted>> {
    ensure_admin(user)?;
    let ordered = OrderItems::find()
        .filter(OrderItemCol::ProductId.eq(id))
        .count(&state.orm)
        .await?;
    if ordered > 0 {
        return Err(AppError::Conflict(
            "Product is referenced by existing orders; deactivate it instead".into(),
        ));
    }

    let result = Products::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Product"));
    }

    audit::record(
        &state.pool,
        user.user_id,
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product deleted successfully",
        Deleted { id },
        Some(Meta::empty()),
    ))
}

/// Price tiers of the given products, keyed by product id.
pub(crate) async fn tiers_by_product<C: ConnectionTrait>(
    conn: &C,
    product_ids: Vec<Uuid>,
) -> AppResult<HashMap<Uuid, Vec<PriceTier>>> {
    let mut by_product: HashMap<Uuid, Vec<PriceTier>> = HashMap::new();
    if product_ids.is_empty() {
        return Ok(by_product);
    }
    let tiers = ProductPriceTiers::find()
        .filter(TierCol::ProductId.is_in(product_ids))
        .order_by_asc(TierCol::Qty)
        .all(conn)
        .await?;
    for tier in tiers {
        by_product
            .entry(tier.product_id)
            .or_default()
            .push(PriceTier::from(tier));
    }
    Ok(by_product)
}

pub(crate) async fn attach_tiers<C: ConnectionTrait>(
    conn: &C,
    models: Vec<ProductModel>,
) -> AppResult<Vec<Product>> {
    let mut tiers = tiers_by_product(conn, models.iter().map(|p| p.id).collect()).await?;
    Ok(models
        .into_iter()
        .map(|model| {
            let product_tiers = tiers.remove(&model.id).unwrap_or_default();
            Product::with_tiers(model, product_tiers)
        })
        .collect())
}

pub(crate) async fn load_product<C: ConnectionTrait>(
    conn: &C,
    model: ProductModel,
) -> AppResult<Product> {
    let mut products = attach_tiers(conn, vec![model]).await?;
    products
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("product vanished while loading")))
}

async fn replace_tiers<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    tiers: &[PriceTier],
) -> AppResult<()> {
    ProductPriceTiers::delete_many()
        .filter(TierCol::ProductId.eq(product_id))
        .exec(conn)
        .await?;
    if tiers.is_empty() {
        return Ok(());
    }
    let rows = tiers.iter().map(|tier| TierActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        qty: Set(tier.qty),
        price: Set(tier.price),
    });
    ProductPriceTiers::insert_many(rows).exec(conn).await?;
    Ok(())
}

async fn ensure_category_exists(state: &AppState, category_id: Uuid) -> AppResult<()> {
    if Categories::find_by_id(category_id)
        .one(&state.orm)
        .await?
        .is_none()
    {
        return Err(AppError::BadRequest("Category does not exist".into()));
    }
    Ok(())
}

async fn ensure_sku_free(state: &AppState, sku: &str, except: Option<Uuid>) -> AppResult<()> {
    let mut finder = Products::find().filter(Column::Sku.eq(sku));
    if let Some(id) = except {
        finder = finder.filter(Column::Id.ne(id));
    }
    if finder.one(&state.orm).await?.is_some() {
        return Err(AppError::Conflict(format!("SKU {sku} is already in use")));
    }
    Ok(())
}

fn validate_amounts(price: Option<i64>, quantity: Option<i32>) -> AppResult<()> {
    if price.is_some_and(|p| p < 0) {
        return Err(AppError::BadRequest("Price must not be negative".into()));
    }
    if quantity.is_some_and(|q| q < 0) {
        return Err(AppError::BadRequest("Quantity must not be negative".into()));
    }
    Ok(())
}

pub(crate) fn required_text(raw: &str, field: &str) -> AppResult<String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(value.to_string())
}

pub(crate) fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_optional_text_clears_the_field() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some(" FERN-01 ".into())), Some("FERN-01".into()));
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn negative_amounts_are_rejected() {
        assert!(validate_amounts(Some(-1), None).is_err());
        assert!(validate_amounts(None, Some(-3)).is_err());
        assert!(validate_amounts(Some(0), Some(0)).is_ok());
    }

    #[test]
    fn required_text_is_trimmed() {
        assert_eq!(required_text("  Monstera ", "Title").unwrap(), "Monstera");
        assert!(matches!(
            required_text("   ", "Title"),
            Err(AppError::BadRequest(msg)) if msg == "Title is required"
        ));
    }
}
