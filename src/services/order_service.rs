use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        Deleted,
        orders::{CreateOrderRequest, OrderDetail, OrderList, UpdateOrderRequest},
    },
    entity::{
        baladias::{Column as BaladiaCol, Entity as Baladias},
        coupons::{Column as CouponCol, Entity as Coupons, Model as CouponModel},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        product_coupons::{Column as ProductCouponCol, Entity as ProductCoupons},
        products::{Column as ProdCol, Entity as Products},
        wilayas::{Entity as Wilayas, Model as WilayaModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderItem, OrderStatus, ProductSummary, Wilaya},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, contains_pattern, search_term},
    services::{
        pricing::{
            baladia_matches, coupon_applies, ensure_coupon_usable, line_discount, line_total,
            merge_lines, normalize_coupon_code, order_total, restock_plan, shipping_cost,
            unit_price,
        },
        product_service::{non_blank, required_text, tiers_by_product},
    },
    state::AppState,
};

pub async fn list_orders(
    state: &AppState,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = search_term(&query.search) {
        let pattern = contains_pattern(&search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(OrderCol::FirstName).ilike(pattern.clone()))
                .add(Expr::col(OrderCol::LastName).ilike(pattern.clone()))
                .add(Expr::col(OrderCol::Phone).ilike(pattern.clone()))
                .add(Expr::col(OrderCol::Email).ilike(pattern)),
        );
    }
    if let Some(status) = search_term(&query.status) {
        let status = status
            .parse::<OrderStatus>()
            .map_err(AppError::BadRequest)?;
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let finder = Orders::find()
        .filter(condition)
        .order_by_desc(OrderCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = build_details(&state.orm, orders).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

pub async fn get_order(state: &AppState, id: Uuid) -> AppResult<ApiResponse<OrderDetail>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;
    let detail = single_detail(&state.orm, order).await?;
    Ok(ApiResponse::success("Order found", detail, Some(Meta::empty())))
}

pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderDetail>> {
    let requested: Vec<(Uuid, i32)> = payload
        .items
        .iter()
        .map(|line| (line.product_id, line.quantity))
        .collect();
    let lines = merge_lines(&requested).map_err(AppError::BadRequest)?;
    let first_name = required_text(&payload.first_name, "First name")?;
    let last_name = required_text(&payload.last_name, "Last name")?;
    let address = required_text(&payload.address, "Address")?;
    let phone = required_text(&payload.phone, "Phone")?;

    let txn = state.orm.begin().await?;

    let product_ids: Vec<Uuid> = lines.iter().map(|(id, _)| *id).collect();
    let products: HashMap<Uuid, _> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids.clone()))
        .lock(LockType::Update)
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
    let tiers = tiers_by_product(&txn, product_ids).await?;

    let coupon = match non_blank(payload.coupon_code) {
        Some(code) => Some(load_usable_coupon(&txn, &code).await?),
        None => None,
    };

    let mut subtotal: i64 = 0;
    let mut discount: i64 = 0;
    let mut priced: Vec<(Uuid, i32, i64)> = Vec::with_capacity(lines.len());
    for &(product_id, quantity) in &lines {
        let product = products.get(&product_id).ok_or_else(|| {
            AppError::BadRequest(format!("Product {product_id} does not exist"))
        })?;
        if !product.is_activated {
            return Err(AppError::BadRequest(format!(
                "Product {} is not available",
                product.title
            )));
        }
        if product.quantity < quantity {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for {}: {} left",
                product.title, product.quantity
            )));
        }

        let product_tiers = tiers.get(&product_id).map(Vec::as_slice).unwrap_or(&[]);
        let unit = unit_price(product.price, product_tiers, quantity);
        let line = line_total(unit, quantity).ok_or_else(total_too_large)?;
        subtotal = subtotal.checked_add(line).ok_or_else(total_too_large)?;
        if let Some((coupon, linked)) = &coupon {
            if coupon_applies(linked, product_id) {
                discount += line_discount(line, coupon.discount);
            }
        }
        priced.push((product_id, quantity, unit));
    }

    let (wilaya, baladia) = resolve_destination(&txn, payload.wilaya_id, payload.baladia).await?;
    let shipping = shipping_cost(wilaya.as_ref(), payload.house);
    let total = order_total(subtotal, discount, shipping).ok_or_else(total_too_large)?;
    let now = Utc::now();

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        first_name: Set(first_name),
        last_name: Set(last_name),
        address: Set(address),
        phone: Set(phone),
        email: Set(non_blank(payload.email)),
        wilaya_id: Set(wilaya.as_ref().map(|w| w.id)),
        baladia: Set(baladia),
        house: Set(payload.house),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        subtotal: Set(subtotal),
        discount: Set(discount),
        shipping_cost: Set(shipping),
        total: Set(total),
        coupon_id: Set(coupon.as_ref().map(|(c, _)| c.id)),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    for (product_id, quantity, unit) in priced {
        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            price: Set(unit),
        }
        .insert(&txn)
        .await?;

        // reduce stock
        Products::update_many()
            .col_expr(ProdCol::Quantity, Expr::col(ProdCol::Quantity).sub(quantity))
            .col_expr(ProdCol::UpdatedAt, Expr::current_timestamp().into())
            .filter(ProdCol::Id.eq(product_id))
            .exec(&txn)
            .await?;
    }

    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "order_create",
        "orders",
        serde_json::json!({ "order_id": order.id, "total": order.total }),
    )
    .await;
    tracing::info!(order_id = %order.id, total = order.total, "order created");

    let detail = single_detail(&state.orm, order).await?;
    Ok(ApiResponse::success(
        "Order created successfully",
        detail,
        Some(Meta::empty()),
    ))
}

pub async fn update_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderRequest,
) -> AppResult<ApiResponse<OrderDetail>> {
    ensure_admin(user)?;
    let next_status = payload
        .status
        .as_deref()
        .map(str::parse::<OrderStatus>)
        .transpose()
        .map_err(AppError::BadRequest)?;

    let txn = state.orm.begin().await?;
    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;
    let current = order
        .status
        .parse::<OrderStatus>()
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

    let mut active: OrderActive = order.clone().into();

    if let Some(next) = next_status {
        if !current.can_transition_to(next) {
            return Err(AppError::BadRequest(
                "Cancelled orders cannot change status".into(),
            ));
        }
        if next == OrderStatus::Cancelled && current != OrderStatus::Cancelled {
            let items = OrderItems::find()
                .filter(OrderItemCol::OrderId.eq(order.id))
                .all(&txn)
                .await?;
            restore_stock(&txn, &items).await?;
        }
        active.status = Set(next.as_str().to_string());
    }
    if let Some(address) = payload.address.as_deref() {
        active.address = Set(required_text(address, "Address")?);
    }
    if let Some(phone) = payload.phone.as_deref() {
        active.phone = Set(required_text(phone, "Phone")?);
    }

    if payload.touches_shipping() {
        let wilaya_changed = payload.wilaya_id.is_some_and(|w| Some(w) != order.wilaya_id);
        let baladia = match payload.baladia.clone() {
            Some(baladia) => Some(baladia),
            None if wilaya_changed => None,
            None => order.baladia.clone(),
        };
        let house = payload.house.unwrap_or(order.house);
        let (wilaya, baladia) =
            resolve_destination(&txn, payload.wilaya_id.or(order.wilaya_id), baladia).await?;
        let shipping = shipping_cost(wilaya.as_ref(), house);

        active.wilaya_id = Set(wilaya.as_ref().map(|w| w.id));
        active.baladia = Set(baladia);
        active.house = Set(house);
        active.shipping_cost = Set(shipping);
        active.total = Set(
            order_total(order.subtotal, order.discount, shipping).ok_or_else(total_too_large)?,
        );
    }

    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "order_update",
        "orders",
        serde_json::json!({
            "order_id": updated.id,
            "status": updated.status,
            "shipping_cost": updated.shipping_cost,
        }),
    )
    .await;

    let detail = single_detail(&state.orm, updated).await?;
    Ok(ApiResponse::success(
        "Order updated successfully",
        detail,
        Some(Meta::empty()),
    ))
}

pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Deleted>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;
    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&txn)
        .await?;

    // cancelled orders already returned their stock
    let restored = if order.status != OrderStatus::Cancelled.as_str() {
        restore_stock(&txn, &items).await?
    } else {
        HashMap::new()
    };

    Orders::delete_by_id(order.id).exec(&txn).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "order_delete",
        "orders",
        serde_json::json!({ "order_id": id, "restored": restored }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order deleted successfully",
        Deleted { id },
        Some(Meta::empty()),
    ))
}

/// Hand each item's quantity back to its product.
async fn restore_stock<C: ConnectionTrait>(
    conn: &C,
    items: &[OrderItemModel],
) -> AppResult<HashMap<Uuid, i32>> {
    let plan = restock_plan(items);
    for (product_id, quantity) in &plan {
        Products::update_many()
            .col_expr(ProdCol::Quantity, Expr::col(ProdCol::Quantity).add(*quantity))
            .col_expr(ProdCol::UpdatedAt, Expr::current_timestamp().into())
            .filter(ProdCol::Id.eq(*product_id))
            .exec(conn)
            .await?;
    }
    Ok(plan)
}

fn total_too_large() -> AppError {
    AppError::BadRequest("Order total is too large".into())
}

async fn load_usable_coupon<C: ConnectionTrait>(
    conn: &C,
    code: &str,
) -> AppResult<(CouponModel, HashSet<Uuid>)> {
    let code = normalize_coupon_code(code);
    let coupon = Coupons::find()
        .filter(CouponCol::Code.eq(code.as_str()))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::BadRequest(format!("Coupon {code} does not exist")))?;
    ensure_coupon_usable(&coupon, Utc::now()).map_err(AppError::BadRequest)?;

    let linked = ProductCoupons::find()
        .filter(ProductCouponCol::CouponId.eq(coupon.id))
        .all(conn)
        .await?
        .into_iter()
        .map(|link| link.product_id)
        .collect();
    Ok((coupon, linked))
}

/// Look up the delivery wilaya and check the baladia against it.
async fn resolve_destination<C: ConnectionTrait>(
    conn: &C,
    wilaya_id: Option<Uuid>,
    baladia: Option<String>,
) -> AppResult<(Option<WilayaModel>, Option<String>)> {
    let baladia = non_blank(baladia);
    let Some(wilaya_id) = wilaya_id else {
        if baladia.is_some() {
            return Err(AppError::BadRequest("A baladia requires a wilaya".into()));
        }
        return Ok((None, None));
    };

    let wilaya = Wilayas::find_by_id(wilaya_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::BadRequest("Wilaya does not exist".into()))?;

    if let Some(name) = baladia.as_deref() {
        let registered = Baladias::find()
            .filter(BaladiaCol::WilayaNumber.eq(wilaya.wilaya_number))
            .all(conn)
            .await?;
        if !baladia_matches(&registered, name) {
            return Err(AppError::BadRequest(format!(
                "Baladia {name} is not part of wilaya {}",
                wilaya.name
            )));
        }
    }

    Ok((Some(wilaya), baladia))
}

async fn single_detail<C: ConnectionTrait>(conn: &C, order: OrderModel) -> AppResult<OrderDetail> {
    build_details(conn, vec![order])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("order vanished while loading")))
}

/// Attach items (with product summaries) and wilaya to each order.
pub(crate) async fn build_details<C: ConnectionTrait>(
    conn: &C,
    orders: Vec<OrderModel>,
) -> AppResult<Vec<OrderDetail>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }
    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(order_ids))
        .all(conn)
        .await?;

    let product_ids: Vec<Uuid> = items
        .iter()
        .map(|i| i.product_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let products: HashMap<Uuid, ProductSummary> = if product_ids.is_empty() {
        HashMap::new()
    } else {
        Products::find()
            .filter(ProdCol::Id.is_in(product_ids))
            .all(conn)
            .await?
            .iter()
            .map(|p| (p.id, ProductSummary::from(p)))
            .collect()
    };

    let wilaya_ids: Vec<Uuid> = orders
        .iter()
        .filter_map(|o| o.wilaya_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let wilayas: HashMap<Uuid, Wilaya> = if wilaya_ids.is_empty() {
        HashMap::new()
    } else {
        Wilayas::find()
            .filter(crate::entity::wilayas::Column::Id.is_in(wilaya_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|w| (w.id, Wilaya::from(w)))
            .collect()
    };

    let mut items_by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for item in items {
        let product = products.get(&item.product_id).cloned();
        items_by_order
            .entry(item.order_id)
            .or_default()
            .push(OrderItem::with_product(item, product));
    }

    Ok(orders
        .into_iter()
        .map(|order| {
            let wilaya = order.wilaya_id.and_then(|id| wilayas.get(&id).cloned());
            let items = items_by_order.remove(&order.id).unwrap_or_default();
            OrderDetail {
                order: Order::from(order),
                items,
                wilaya,
            }
        })
        .collect())
}
