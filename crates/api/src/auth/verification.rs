//! One-time e-mail verification codes.
//!
//! Registration issues a six-digit code through a [`CodeSender`]; confirming
//! the code activates the account. Pending codes live in process memory and
//! expire after a configurable TTL.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use hotel_core::error::CoreError;
use hotel_core::types::Timestamp;
use rand::Rng;
use tokio::sync::RwLock;

use crate::config::MAX_VERIFICATION_CODE_TTL_MINS;

/// Delivers a verification code to an e-mail address.
#[async_trait]
pub trait CodeSender: Send + Sync {
    async fn send(&self, email: &str, code: &str) -> Result<(), CoreError>;
}

/// Development sender: writes the code to the log instead of mailing it.
pub struct LogCodeSender;

#[async_trait]
impl CodeSender for LogCodeSender {
    async fn send(&self, email: &str, code: &str) -> Result<(), CoreError> {
        tracing::info!(%email, %code, "Verification code issued");
        Ok(())
    }
}

struct PendingCode {
    code: String,
    expires_at: Timestamp,
}

/// Issues and checks verification codes keyed by lower-cased e-mail.
pub struct EmailVerifier {
    sender: Arc<dyn CodeSender>,
    ttl: chrono::Duration,
    pending: RwLock<HashMap<String, PendingCode>>,
}

/// A uniformly random six-digit code, zero padded.
pub fn generate_code() -> String {
    format!("{:06}", rand::rng().random_range(0..1_000_000u32))
}

impl EmailVerifier {
    /// `ttl_mins` is clamped to [`MAX_VERIFICATION_CODE_TTL_MINS`].
    pub fn new(sender: Arc<dyn CodeSender>, ttl_mins: i64) -> Self {
        Self {
            sender,
            ttl: chrono::Duration::minutes(ttl_mins.clamp(0, MAX_VERIFICATION_CODE_TTL_MINS)),
            pending: RwLock::new(HashMap::new()),
        }
    }

    /// Issue a new code for `email`, replacing any previous one.
    ///
    /// Expired codes of other addresses are dropped on the way. If the sender
    /// fails, no code stays pending for `email`.
    pub async fn issue(&self, email: &str) -> Result<(), CoreError> {
        let key = email.trim().to_lowercase();
        let code = generate_code();
        let now = Utc::now();
        {
            let mut pending = self.pending.write().await;
            pending.retain(|_, p| p.expires_at > now);
            pending.insert(
                key.clone(),
                PendingCode {
                    code: code.clone(),
                    expires_at: now + self.ttl,
                },
            );
        }

        if let Err(err) = self.sender.send(&key, &code).await {
            self.pending.write().await.remove(&key);
            return Err(err);
        }
        Ok(())
    }

    /// Consume the pending code for `email` if `code` matches and is live.
    ///
    /// A wrong code leaves the pending entry in place; an expired one is
    /// removed.
    pub async fn confirm(&self, email: &str, code: &str) -> Result<(), CoreError> {
        let key = email.trim().to_lowercase();
        let mut pending = self.pending.write().await;

        let Some(entry) = pending.get(&key) else {
            return Err(invalid_code());
        };
        if entry.expires_at <= Utc::now() {
            pending.remove(&key);
            return Err(CoreError::InvalidRequest(
                "Verification code has expired".into(),
            ));
        }
        if entry.code != code.trim() {
            return Err(invalid_code());
        }

        pending.remove(&key);
        Ok(())
    }
}

fn invalid_code() -> CoreError {
    CoreError::InvalidRequest("Invalid verification code".into())
}
