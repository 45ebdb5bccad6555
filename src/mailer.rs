use async_trait::async_trait;

/// Delivers a seller's verification link.
#[async_trait]
pub trait VerificationMailer: Send + Sync {
    async fn send_verification(&self, email: &str, token: &str) -> anyhow::Result<()>;
}

/// Writes the link to the log instead of sending mail.
#[derive(Debug, Clone)]
pub struct LogMailer {
    verify_url: String,
}

impl LogMailer {
    pub fn new(verify_url: impl Into<String>) -> Self {
        Self {
            verify_url: verify_url.into(),
        }
    }
}

#[async_trait]
impl VerificationMailer for LogMailer {
    async fn send_verification(&self, email: &str, token: &str) -> anyhow::Result<()> {
        tracing::info!(
            to = email,
            link = %format!("{}?token={token}", self.verify_url),
            "seller verification link"
        );
        Ok(())
    }
}
