use axum::http::StatusCode;
use planted_api::{
    config::JwtConfig,
    db::{create_pool, run_migrations},
    dto::{
        categories::CategoryRequest,
        products::CreateProductRequest,
        wilayas::{CreateWilayaRequest, UpdateWilayaRequest},
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::Role,
    routes::params::ProductListQuery,
    services::{category_service, product_service, wilaya_service},
    state::AppState,
};
use uuid::Uuid;

#[tokio::test]
async fn catalogue_deletes_and_duplicates_are_guarded() -> anyhow::Result<()> {
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

    // A category with products cannot be removed until it is empty.
    let succulents = category_service::create_category(
        &state,
        &admin,
        CategoryRequest {
            name: " Succulents ".into(),
        },
    )
    .await?
    .data
    .expect("category");
    assert_eq!(succulents.name, "Succulents");

    let planter = create_product(&state, &admin, "50% Off Planter", Some(succulents.id)).await?;
    create_product(&state, &admin, "500 Seeds", None).await?;

    let err = category_service::delete_category(&state, &admin, succulents.id)
        .await
        .expect_err("category still has products");
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(err.status(), StatusCode::CONFLICT);

    let err = category_service::create_category(
        &state,
        &admin,
        CategoryRequest {
            name: "Succulents".into(),
        },
    )
    .await
    .expect_err("duplicate category");
    assert_eq!(err.status(), StatusCode::CONFLICT);

    // Wildcards typed by the user are matched literally.
    let found = product_service::list_products(
        &state,
        ProductListQuery {
            search: Some("50%".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("products");
    assert_eq!(
        found.items.iter().map(|p| p.id).collect::<Vec<_>>(),
        vec![planter]
    );

    product_service::delete_product(&state, &admin, planter).await?;
    category_service::delete_category(&state, &admin, succulents.id).await?;

    // Wilaya names and numbers are unique on create and update.
    let oran = wilaya_service::create_wilaya(&state, &admin, wilaya("Oran", 31))
        .await?
        .data
        .expect("wilaya");
    let tlemcen = wilaya_service::create_wilaya(&state, &admin, wilaya("Tlemcen", 13))
        .await?
        .data
        .expect("wilaya");

    let err = wilaya_service::create_wilaya(&state, &admin, wilaya("Oran", 99))
        .await
        .expect_err("duplicate name");
    assert_eq!(err.status(), StatusCode::CONFLICT);

    let err = wilaya_service::create_wilaya(&state, &admin, wilaya("Mostaganem", 31))
        .await
        .expect_err("duplicate number");
    assert_eq!(err.status(), StatusCode::CONFLICT);

    let err = wilaya_service::update_wilaya(
        &state,
        &admin,
        tlemcen.id,
        UpdateWilayaRequest {
            wilaya_number: Some(oran.wilaya_number),
            ..Default::default()
        },
    )
    .await
    .expect_err("number taken by another wilaya");
    assert_eq!(err.status(), StatusCode::CONFLICT);

    Ok(())
}

fn wilaya(name: &str, number: i32) -> CreateWilayaRequest {
    CreateWilayaRequest {
        name: Some(name.into()),
        wilaya_number: Some(number),
        delivery_price: Some(500),
        home_delivery_price: Some(700),
        agency_name: Some("Yalidine".into()),
    }
}

async fn create_product(
    state: &AppState,
    admin: &AuthUser,
    title: &str,
    category_id: Option<Uuid>,
) -> anyhow::Result<Uuid> {
    let product = product_service::create_product(
        state,
        admin,
        CreateProductRequest {
            title: title.into(),
            description: String::new(),
            image_url: None,
            price: 1200,
            sku: None,
            quantity: 5,
            category_id,
            is_activated: None,
            price_tiers: Vec::new(),
        },
    )
    .await?
    .data
    .ok_or_else(|| anyhow::anyhow!("product {title} missing"))?;
    Ok(product.id)
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url, 5).await?;
    run_migrations(&pool).await?;

    sqlx::query(
        "TRUNCATE TABLE order_items, orders, product_coupons, coupons, product_price_tiers, \
         products, categories, baladias, wilayas, audit_logs CASCADE",
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
