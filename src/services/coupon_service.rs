use std::collections::HashSet;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, LoaderTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        Deleted,
        coupons::{CouponList, CreateCouponRequest, UpdateCouponRequest},
    },
    entity::{
        coupons::{ActiveModel, Column, Entity as Coupons, Model as CouponModel},
        product_coupons::{
            ActiveModel as LinkActive, Column as LinkCol, Entity as ProductCoupons,
        },
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Coupon, ProductSummary},
    response::{ApiResponse, Meta},
    routes::params::{CouponListQuery, contains_pattern, search_term},
    services::pricing::{normalize_coupon_code, validate_discount},
    state::AppState,
};

pub async fn list_coupons(
    state: &AppState,
    user: &AuthUser,
    query: CouponListQuery,
) -> AppResult<ApiResponse<CouponList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();
    if let Some(search) = search_term(&query.search) {
        condition = condition.add(Expr::col(Column::Code).ilike(contains_pattern(&search)));
    }
    if let Some(is_active) = query.is_active {
        condition = condition.add(Column::IsActive.eq(is_active));
    }

    let finder = Coupons::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = attach_products(&state.orm, models).await?;

    Ok(ApiResponse::success(
        "Coupons",
        CouponList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_coupon(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Coupon>> {
    ensure_admin(user)?;
    let coupon = find_coupon(&state.orm, id).await?;
    let coupon = load_coupon(&state.orm, coupon).await?;
    Ok(ApiResponse::success("Coupon", coupon, None))
}

pub async fn create_coupon(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCouponRequest,
) -> AppResult<ApiResponse<Coupon>> {
    ensure_admin(user)?;
    let (Some(code), Some(discount)) = (payload.code.as_deref(), payload.discount) else {
        return Err(AppError::BadRequest(
            "Coupon code and discount are required".into(),
        ));
    };
    let code = normalize_coupon_code(code);
    if code.is_empty() {
        return Err(AppError::BadRequest("Coupon code is required".into()));
    }
    validate_discount(discount).map_err(AppError::BadRequest)?;
    let product_ids = unique_ids(payload.product_ids.unwrap_or_default());

    let txn = state.orm.begin().await?;
    ensure_code_free(&txn, &code, None).await?;
    ensure_products_exist(&txn, &product_ids).await?;

    let now = Utc::now();
    let coupon = ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set(code),
        discount: Set(discount),
        is_active: Set(payload.is_active.unwrap_or(true)),
        expires_at: Set(payload.expires_at.map(Into::into)),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;
    link_products(&txn, coupon.id, &product_ids).await?;
    let coupon = load_coupon(&txn, coupon).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "coupon_create",
        "coupons",
        serde_json::json!({ "coupon_id": coupon.id, "code": coupon.code }),
    )
    .await;

    Ok(ApiResponse::success(
        "Coupon created successfully",
        coupon,
        Some(Meta::empty()),
    ))
}

pub async fn update_coupon(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCouponRequest,
) -> AppResult<ApiResponse<Coupon>> {
    ensure_admin(user)?;
    if let Some(discount) = payload.discount {
        validate_discount(discount).map_err(AppError::BadRequest)?;
    }

    let txn = state.orm.begin().await?;
    let existing = find_coupon(&txn, id).await?;
    let mut active: ActiveModel = existing.into();

    if let Some(code) = payload.code.as_deref() {
        let code = normalize_coupon_code(code);
        if code.is_empty() {
            return Err(AppError::BadRequest("Coupon code is required".into()));
        }
        ensure_code_free(&txn, &code, Some(id)).await?;
        active.code = Set(code);
    }
    if let Some(discount) = payload.discount {
        active.discount = Set(discount);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(expires_at) = payload.expires_at {
        active.expires_at = Set(expires_at.map(Into::into));
    }
    active.updated_at = Set(Utc::now().into());
    let coupon = active.update(&txn).await?;

    if let Some(product_ids) = payload.product_ids {
        let product_ids = unique_ids(product_ids);
        ensure_products_exist(&txn, &product_ids).await?;
        ProductCoupons::delete_many()
            .filter(LinkCol::CouponId.eq(coupon.id))
            .exec(&txn)
            .await?;
        link_products(&txn, coupon.id, &product_ids).await?;
    }

    let coupon = load_coupon(&txn, coupon).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "coupon_update",
        "coupons",
        serde_json::json!({ "coupon_id": coupon.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Coupon updated successfully",
        coupon,
        Some(Meta::empty()),
    ))
}

pub async fn delete_coupon(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Deleted>> {
    ensure_admin(user)?;
    let result = Coupons::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Coupon"));
    }

    audit::record(
        &state.pool,
        user.user_id,
        "coupon_delete",
        "coupons",
        serde_json::json!({ "coupon_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Coupon deleted successfully",
        Deleted { id },
        Some(Meta::empty()),
    ))
}

async fn find_coupon<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<CouponModel> {
    Coupons::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Coupon"))
}

async fn ensure_code_free<C: ConnectionTrait>(
    conn: &C,
    code: &str,
    except: Option<Uuid>,
) -> AppResult<()> {
    let mut finder = Coupons::find().filter(Column::Code.eq(code));
    if let Some(id) = except {
        finder = finder.filter(Column::Id.ne(id));
    }
    if finder.one(conn).await?.is_some() {
        return Err(AppError::BadRequest("Coupon code already exists".into()));
    }
    Ok(())
}

async fn ensure_products_exist<C: ConnectionTrait>(conn: &C, ids: &[Uuid]) -> AppResult<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let found = Products::find()
        .filter(ProdCol::Id.is_in(ids.to_vec()))
        .count(conn)
        .await?;
    if found as usize != ids.len() {
        return Err(AppError::BadRequest(
            "One or more products do not exist".into(),
        ));
    }
    Ok(())
}

async fn link_products<C: ConnectionTrait>(
    conn: &C,
    coupon_id: Uuid,
    product_ids: &[Uuid],
) -> AppResult<()> {
    if product_ids.is_empty() {
        return Ok(());
    }
    let rows = product_ids.iter().map(|product_id| LinkActive {
        coupon_id: Set(coupon_id),
        product_id: Set(*product_id),
    });
    ProductCoupons::insert_many(rows)
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

async fn load_coupon<C: ConnectionTrait>(conn: &C, model: CouponModel) -> AppResult<Coupon> {
    attach_products(conn, vec![model])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("coupon vanished while loading")))
}

async fn attach_products<C: ConnectionTrait>(
    conn: &C,
    models: Vec<CouponModel>,
) -> AppResult<Vec<Coupon>> {
    if models.is_empty() {
        return Ok(Vec::new());
    }
    let linked = models
        .load_many_to_many(Products, ProductCoupons, conn)
        .await?;

    Ok(models
        .into_iter()
        .zip(linked)
        .map(|(model, products)| {
            let products = products.iter().map(ProductSummary::from).collect();
            Coupon::with_products(model, products)
        })
        .collect())
}

/// Drop repeated ids, keeping first-seen order.
fn unique_ids(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_product_ids_are_collapsed() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(unique_ids(vec![a, b, a, a]), vec![a, b]);
        assert!(unique_ids(Vec::new()).is_empty());
    }
}
