use chrono::{DateTime, Duration, Utc};
use password_hash::rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

pub const TOKEN_BYTES: usize = 32;

/// How long a verification link stays valid.
pub const TOKEN_TTL_MINUTES: i64 = 60;

/// A freshly issued token. Only `hash` is stored; `plain` goes to the seller.
#[derive(Debug, Clone)]
pub struct VerificationToken {
    pub plain: String,
    pub hash: String,
    pub expires_at: DateTime<Utc>,
}

impl VerificationToken {
    pub fn issue(now: DateTime<Utc>) -> Self {
        let mut bytes = [0_u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let plain: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        Self {
            hash: hash_token(&plain),
            plain,
            expires_at: now + Duration::minutes(TOKEN_TTL_MINUTES),
        }
    }
}

pub fn hash_token(plain: &str) -> String {
    format!("{:x}", Sha256::digest(plain.as_bytes()))
}

pub fn is_expired(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    expires_at <= now
}
