use axum::http::StatusCode;
use chrono::{Duration, Utc};
use planted_api::{
    config::JwtConfig,
    db::{create_pool, run_migrations},
    dto::coupons::{CreateCouponRequest, UpdateCouponRequest},
    entity::products::ActiveModel as ProductActive,
    error::AppError,
    middleware::auth::AuthUser,
    models::Role,
    services::coupon_service,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

#[tokio::test]
async fn coupon_codes_are_unique_and_links_are_replaced() -> anyhow::Result<()> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;
    let admin = AuthUser {
        user_id: Uuid::new_v4(),
        role: Role::Admin,
    };
    let employee = AuthUser {
        user_id: Uuid::new_v4(),
        role: Role::Employee,
    };
    let cactus = create_product(&state, "Golden Barrel Cactus").await?;
    let pot = create_product(&state, "Glazed Pot").await?;

    let created = coupon_service::create_coupon(
        &state,
        &admin,
        request(" welcome10 ", 10, vec![cactus]),
    )
    .await?
    .data
    .expect("coupon");
    assert_eq!(created.code, "WELCOME10");
    assert!(created.is_active);
    assert_eq!(created.products.len(), 1);

    // Same code in another case is a duplicate.
    let err = coupon_service::create_coupon(&state, &admin, request("Welcome10", 5, vec![]))
        .await
        .expect_err("duplicate code");
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    assert_eq!(err.to_string(), "Coupon code already exists");

    let err = coupon_service::create_coupon(&state, &admin, request("BIG", 150, vec![]))
        .await
        .expect_err("discount out of range");
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = coupon_service::create_coupon(&state, &admin, request("GHOST", 5, vec![Uuid::new_v4()]))
        .await
        .expect_err("unknown product");
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = coupon_service::create_coupon(&state, &employee, request("STAFF", 5, vec![]))
        .await
        .expect_err("admin only");
    assert_eq!(err.status(), StatusCode::FORBIDDEN);

    // Replace links and set, then clear, the expiry.
    let expires = Utc::now() + Duration::days(7);
    let updated = coupon_service::update_coupon(
        &state,
        &admin,
        created.id,
        UpdateCouponRequest {
            product_ids: Some(vec![pot, pot]),
            expires_at: Some(Some(expires)),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("coupon");
    assert_eq!(
        updated.products.iter().map(|p| p.id).collect::<Vec<_>>(),
        vec![pot]
    );
    assert!(updated.expires_at.is_some());

    let cleared = coupon_service::update_coupon(
        &state,
        &admin,
        created.id,
        UpdateCouponRequest {
            expires_at: Some(None),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("coupon");
    assert_eq!(cleared.expires_at, None);
    assert_eq!(cleared.products.len(), 1);

    coupon_service::delete_coupon(&state, &admin, created.id).await?;
    let err = coupon_service::delete_coupon(&state, &admin, created.id)
        .await
        .expect_err("already deleted");
    assert_eq!(err.status(), StatusCode::NOT_FOUND);

    Ok(())
}

fn request(code: &str, discount: i32, product_ids: Vec<Uuid>) -> CreateCouponRequest {
    CreateCouponRequest {
        code: Some(code.into()),
        discount: Some(discount),
        is_active: None,
        expires_at: None,
        product_ids: Some(product_ids),
    }
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url, 5).await?;
    run_migrations(&pool).await?;

    sqlx::query(
        "TRUNCATE TABLE order_items, orders, product_coupons, coupons, product_price_tiers, \
         products, categories, audit_logs CASCADE",
    )
    .execute(&pool)
    .await?;

    Ok(AppState::new(
        pool,
        JwtConfig {
            secret: "flow-test-secret".into(),
            ttl_hours: 1,
        },
    ))
}

async fn create_product(state: &AppState, title: &str) -> anyhow::Result<Uuid> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        title: Set(title.into()),
        description: Set(String::new()),
        image_url: Set(None),
        price: Set(1500),
        sku: Set(None),
        quantity: Set(20),
        is_activated: Set(true),
        category_id: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(product.id)
}
