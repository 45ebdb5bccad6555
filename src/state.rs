use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn, orm_from_pool},
    mailer::{LogMailer, VerificationMailer},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: AppConfig,
    pub mailer: Arc<dyn VerificationMailer>,
}

impl AppState {
    pub fn new(pool: DbPool, config: AppConfig) -> Self {
        let verify_url = format!("{}/api/sellers/verify", config.public_url);
        Self::with_mailer(pool, config, Arc::new(LogMailer::new(verify_url)))
    }

    pub fn with_mailer(
        pool: DbPool,
        config: AppConfig,
        mailer: Arc<dyn VerificationMailer>,
    ) -> Self {
        let orm = orm_from_pool(&pool);
        Self {
            pool,
            orm,
            config,
            mailer,
        }
    }
}
