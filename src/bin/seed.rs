use planted_api::{
    config::AppConfig,
    db::{DbPool, create_pool, run_migrations},
    models::Role,
    services::auth_service::hash_password,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, 2).await?;
    run_migrations(&pool).await?;

    let admin_id = ensure_user(&pool, "admin@planted.com", "admin123", Role::Admin).await?;
    let employee_id =
        ensure_user(&pool, "employee@planted.com", "employee123", Role::Employee).await?;
    let plants = ensure_category(&pool, "Plants").await?;
    let accessories = ensure_category(&pool, "Accessories").await?;
    seed_products(&pool, plants, accessories).await?;
    seed_wilayas(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, Employee ID: {employee_id}");
    Ok(())
}

async fn ensure_user(pool: &DbPool, email: &str, password: &str, role: Role) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role.as_str())
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn ensure_category(pool: &DbPool, name: &str) -> anyhow::Result<Uuid> {
    let (category_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO categories (id, name)
        VALUES ($1, $2)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .fetch_one(pool)
    .await?;
    Ok(category_id)
}

async fn seed_products(pool: &DbPool, plants: Uuid, accessories: Uuid) -> anyhow::Result<()> {
    let products: Vec<(&str, &str, &str, i64, i32, Uuid)> = vec![
        ("Monstera Deliciosa", "Split-leaf tropical plant, 60 cm", "PLT-MONSTERA", 4500, 12, plants),
        ("Snake Plant", "Hardy low-light Sansevieria", "PLT-SNAKE", 2500, 30, plants),
        ("Fiddle Leaf Fig", "Ficus lyrata in nursery pot", "PLT-FIDDLE", 6000, 4, plants),
        ("Terracotta Pot 20cm", "Hand-made clay pot with saucer", "ACC-POT-20", 900, 80, accessories),
        ("Watering Can", "1.5 L brass-spout can", "ACC-CAN", 1800, 25, accessories),
    ];

    for (title, description, sku, price, quantity, category_id) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, title, description, sku, price, quantity, category_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (sku) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(description)
        .bind(sku)
        .bind(price)
        .bind(quantity)
        .bind(category_id)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

async fn seed_wilayas(pool: &DbPool) -> anyhow::Result<()> {
    let wilayas: Vec<(&str, i32, i64, Option<i64>)> = vec![
        ("Alger", 16, 400, Some(600)),
        ("Oran", 31, 600, Some(800)),
        ("Constantine", 25, 600, Some(850)),
        ("Blida", 9, 450, None),
    ];

    for (name, number, delivery_price, home_delivery_price) in wilayas {
        sqlx::query(
            r#"
            INSERT INTO wilayas (id, name, wilaya_number, delivery_price, home_delivery_price, agency_name)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (wilaya_number) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(number)
        .bind(delivery_price)
        .bind(home_delivery_price)
        .bind("Yalidine")
        .execute(pool)
        .await?;
    }

    println!("Seeded wilayas");
    Ok(())
}
