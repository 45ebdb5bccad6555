mod common;

use std::sync::{Arc, Mutex};

use artisan_market_api::{
    dto::auth::{BuyerSignupRequest, LoginRequest, SellerSignupRequest},
    entity::sellers::{self, Entity as Sellers},
    error::AppError,
    mailer::VerificationMailer,
    middleware::auth::AuthSeller,
    models::ActorKind,
    routes::create_app,
    services::auth_service,
    state::AppState,
};
use async_trait::async_trait;
use axum::{
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use tower::ServiceExt;
use uuid::Uuid;

fn email(prefix: &str) -> String {
    format!("{prefix}-{}@example.test", Uuid::new_v4())
}

fn buyer_signup(email: &str, password: &str) -> BuyerSignupRequest {
    BuyerSignupRequest {
        email: email.into(),
        full_name: "Ada Potter".into(),
        password: password.into(),
    }
}

fn seller_signup(email: &str) -> SellerSignupRequest {
    SellerSignupRequest {
        email: email.into(),
        full_name: "Bea Weaver".into(),
        password: "loom-secret".into(),
        business_name: "Bea's Looms".into(),
        description: None,
    }
}

#[derive(Default)]
struct CapturingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl CapturingMailer {
    fn last_token(&self) -> Option<String> {
        self.sent.lock().unwrap().last().map(|(_, token)| token.clone())
    }
}

#[async_trait]
impl VerificationMailer for CapturingMailer {
    async fn send_verification(&self, email: &str, token: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), token.to_string()));
        Ok(())
    }
}

#[tokio::test]
async fn signup_rejects_duplicates_and_short_passwords() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let address = email("dup");

    let buyer = auth_service::register_buyer(&state, buyer_signup(&address, "glaze-42"))
        .await?
        .data
        .expect("buyer");
    assert_eq!(buyer.email, address);

    let err = auth_service::register_buyer(&state, buyer_signup(&address, "glaze-42"))
        .await
        .unwrap_err();
    assert!(matches!(&err, AppError::BadRequest(m) if m == "Email is already taken"), "got {err:?}");

    let err = auth_service::register_buyer(&state, buyer_signup(&email("short"), "abc12"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");

    // Buyers and sellers are separate tables, so one email may be both.
    auth_service::register_seller(&state, seller_signup(&address)).await?;
    Ok(())
}

#[tokio::test]
async fn concurrent_duplicate_signups_leave_one_account() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let address = email("race");

    let (a, b) = tokio::join!(
        auth_service::register_seller(&state, seller_signup(&address)),
        auth_service::register_seller(&state, seller_signup(&address)),
    );

    let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(successes, 1);
    let failure = if a.is_err() { a.err() } else { b.err() };
    assert!(matches!(failure, Some(AppError::BadRequest(_))), "got {failure:?}");
    Ok(())
}

#[tokio::test]
async fn wrong_credentials_are_a_bad_request() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let address = email("login");
    auth_service::register_buyer(&state, buyer_signup(&address, "right-password")).await?;

    for (who, password) in [(address.as_str(), "wrong-password"), ("nobody@example.test", "right-password")] {
        let err = auth_service::login(
            &state,
            ActorKind::Buyer,
            LoginRequest {
                email: who.into(),
                password: password.into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");
    }

    // A buyer account cannot log in through the seller door.
    let err = auth_service::login(
        &state,
        ActorKind::Seller,
        LoginRequest {
            email: address,
            password: "right-password".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");
    Ok(())
}

#[tokio::test]
async fn login_token_reaches_me_endpoints() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let buyer_email = email("me-buyer");
    let seller_email = email("me-seller");
    auth_service::register_buyer(&state, buyer_signup(&buyer_email, "spindle-9")).await?;
    auth_service::register_seller(&state, seller_signup(&seller_email)).await?;

    let buyer_token = auth_service::login(
        &state,
        ActorKind::Buyer,
        LoginRequest {
            email: buyer_email.clone(),
            password: "spindle-9".into(),
        },
    )
    .await?
    .data
    .expect("login")
    .token;
    let seller_token = auth_service::login(
        &state,
        ActorKind::Seller,
        LoginRequest {
            email: seller_email.clone(),
            password: "loom-secret".into(),
        },
    )
    .await?
    .data
    .expect("login")
    .token;

    let get = |uri: &str, token: &str| {
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(header::AUTHORIZATION, token)
            .body(Body::empty())
            .unwrap()
    };

    let app = create_app(state.clone());
    let res = app.clone().oneshot(get("/api/buyers/me", &buyer_token)).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(&to_bytes(res.into_body(), usize::MAX).await?)?;
    assert_eq!(body["data"]["email"], buyer_email.as_str());

    let res = app.clone().oneshot(get("/api/sellers/me", &seller_token)).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(&to_bytes(res.into_body(), usize::MAX).await?)?;
    assert_eq!(body["data"]["email"], seller_email.as_str());
    assert_eq!(body["data"]["verified"], false);

    let res = app.oneshot(get("/api/sellers/me", &buyer_token)).await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn verification_token_marks_the_seller_verified_once() -> anyhow::Result<()> {
    let Some(base) = common::setup_state().await? else {
        return Ok(());
    };
    let mailer = Arc::new(CapturingMailer::default());
    let state = AppState::with_mailer(base.pool.clone(), base.config.clone(), mailer.clone());
    let seller = common::create_seller(&state, "Verified Glass").await?;

    let err = auth_service::verify_seller(&state, None).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");
    let err = auth_service::verify_seller(&state, Some("not-a-token".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");

    auth_service::request_verification(&state, &seller).await?;
    let token = mailer.last_token().expect("token sent");
    let stored = Sellers::find_by_id(seller.seller_id)
        .one(&state.orm)
        .await?
        .expect("seller");
    assert_ne!(stored.verification_token_hash.as_deref(), Some(token.as_str()));

    let verified = auth_service::verify_seller(&state, Some(token.clone()))
        .await?
        .data
        .expect("seller");
    assert!(verified.verified);

    let err = auth_service::verify_seller(&state, Some(token)).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");
    let err = auth_service::request_verification(&state, &seller)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");
    Ok(())
}

#[tokio::test]
async fn expired_or_replaced_tokens_are_rejected() -> anyhow::Result<()> {
    let Some(base) = common::setup_state().await? else {
        return Ok(());
    };
    let mailer = Arc::new(CapturingMailer::default());
    let state = AppState::with_mailer(base.pool.clone(), base.config.clone(), mailer.clone());
    let seller: AuthSeller = common::create_seller(&state, "Late Letters").await?;

    auth_service::request_verification(&state, &seller).await?;
    let first = mailer.last_token().expect("token sent");
    auth_service::request_verification(&state, &seller).await?;
    let second = mailer.last_token().expect("token sent");

    let err = auth_service::verify_seller(&state, Some(first)).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");

    let stored = Sellers::find_by_id(seller.seller_id)
        .one(&state.orm)
        .await?
        .expect("seller");
    let mut active: sellers::ActiveModel = stored.into();
    active.verification_expires_at = Set(Some((Utc::now() - Duration::minutes(1)).into()));
    active.update(&state.orm).await?;

    let err = auth_service::verify_seller(&state, Some(second)).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");

    let stored = Sellers::find_by_id(seller.seller_id)
        .one(&state.orm)
        .await?
        .expect("seller");
    assert!(!stored.verified);
    Ok(())
}
