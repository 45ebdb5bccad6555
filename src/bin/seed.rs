use artisan_market_api::{
    config::AppConfig,
    db::{DbPool, create_pool, orm_from_pool, run_migrations},
    services::auth_service::hash_password,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, 2).await?;
    run_migrations(&orm_from_pool(&pool)).await?;

    let seller_id = ensure_seller(&pool, "maker@example.com", "maker123").await?;
    let buyer_id = ensure_buyer(&pool, "buyer@example.com", "buyer123").await?;
    seed_products(&pool, seller_id).await?;

    println!("Seed completed. Seller ID: {seller_id}, Buyer ID: {buyer_id}");
    Ok(())
}

async fn ensure_seller(pool: &DbPool, email: &str, password: &str) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO sellers (id, email, full_name, password_hash, business_name, description)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (email) DO UPDATE SET business_name = EXCLUDED.business_name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind("Mira Potter")
    .bind(password_hash)
    .bind("Riverbank Pottery")
    .bind("Wheel-thrown stoneware, fired in small batches")
    .fetch_one(pool)
    .await?;

    println!("Ensured seller {email}");
    Ok(id)
}

async fn ensure_buyer(pool: &DbPool, email: &str, password: &str) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO buyers (id, email, full_name, password_hash)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET full_name = EXCLUDED.full_name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind("Sam Buyer")
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    println!("Ensured buyer {email}");
    Ok(id)
}

async fn seed_products(pool: &DbPool, seller_id: Uuid) -> anyhow::Result<()> {
    let products = [
        ("Stoneware Mug", "Speckled glaze, 350 ml", 2800_i64, 40, "ceramics", &["mug", "kitchen"][..]),
        ("Serving Bowl", "Hand-thrown, ash glaze", 6400, 12, "ceramics", &["bowl", "kitchen"][..]),
        ("Linen Tea Towel", "Block-printed linen", 1500, 60, "textiles", &["linen"][..]),
        ("Walnut Spoon", "Carved from a single piece of walnut", 2200, 25, "woodwork", &["spoon", "kitchen"][..]),
    ];

    for (title, description, price, stock, category, tags) in products {
        let exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM products WHERE seller_id = $1 AND title = $2")
                .bind(seller_id)
                .bind(title)
                .fetch_optional(pool)
                .await?;
        if exists.is_some() {
            continue;
        }

        let tags: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
        sqlx::query(
            r#"
            INSERT INTO products (id, seller_id, title, description, price, stock, category, tags)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(seller_id)
        .bind(title)
        .bind(description)
        .bind(price)
        .bind(stock)
        .bind(category)
        .bind(tags)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
