#![allow(dead_code)]

use artisan_market_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    dto::products::CreateProductRequest,
    entity::{buyers, sellers},
    middleware::auth::{AuthBuyer, AuthSeller},
    models::Product,
    services::product_service,
    state::AppState,
};
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, Set};
use tokio::sync::OnceCell;
use uuid::Uuid;

static MIGRATED: OnceCell<()> = OnceCell::const_new();

/// Connect to the test database, or `None` when none is configured.
pub async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run database flows.");
            return Ok(None);
        }
    };

    let config = AppConfig {
        database_url: database_url.clone(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".into(),
        jwt_ttl_hours: 1,
        db_max_connections: 8,
        public_url: "http://127.0.0.1".into(),
    };
    let pool = create_pool(&database_url, config.db_max_connections).await?;
    let state = AppState::new(pool, config);

    MIGRATED
        .get_or_try_init(|| async { run_migrations(&state.orm).await })
        .await?;

    Ok(Some(state))
}

fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.test", Uuid::new_v4())
}

pub async fn create_buyer(state: &AppState, full_name: &str) -> anyhow::Result<AuthBuyer> {
    let buyer = buyers::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(unique_email("buyer")),
        full_name: Set(full_name.into()),
        password_hash: Set("not-a-real-hash".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(AuthBuyer { buyer_id: buyer.id })
}

pub async fn create_seller(state: &AppState, business_name: &str) -> anyhow::Result<AuthSeller> {
    let seller = sellers::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(unique_email("seller")),
        full_name: Set("Test Maker".into()),
        password_hash: Set("not-a-real-hash".into()),
        business_name: Set(business_name.into()),
        description: Set(String::new()),
        verified: Set(false),
        verification_token_hash: Set(None),
        verification_expires_at: Set(None),
        rating: Set(0.0),
        total_reviews: Set(0),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(AuthSeller {
        seller_id: seller.id,
    })
}

pub async fn create_product(
    state: &AppState,
    seller: &AuthSeller,
    title: &str,
    price: i64,
    stock: i32,
) -> anyhow::Result<Product> {
    let resp = product_service::create_product(
        state,
        seller,
        CreateProductRequest {
            title: title.into(),
            description: String::new(),
            price,
            stock,
            category: Some("test".into()),
            tags: vec![],
        },
    )
    .await?;
    Ok(resp.data.expect("product"))
}
