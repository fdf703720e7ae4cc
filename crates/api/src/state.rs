use std::sync::Arc;

use hotel_core::policy::PolicyEngine;
use hotel_db::repositories::Repositories;
use hotel_db::DbPool;

use crate::auth::session::SessionStore;
use crate::auth::verification::{CodeSender, EmailVerifier};
use crate::config::ServerConfig;
use crate::middleware::auth::AuthGate;

/// Shared application state available to all handlers via Axum's `State` extractor.
///
/// Cloned per request; every field is cheaply cloneable or behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// `None` when running on the in-memory backend.
    pub pool: Option<DbPool>,
    pub repos: Repositories,
    pub sessions: Arc<SessionStore>,
    pub gate: Arc<AuthGate>,
    pub verifier: Arc<EmailVerifier>,
}

impl AppState {
    /// Wire sessions, the auth gate and the e-mail verifier over `repos`.
    pub fn new(
        config: ServerConfig,
        pool: Option<DbPool>,
        repos: Repositories,
        policy: PolicyEngine,
        sender: Arc<dyn CodeSender>,
    ) -> Self {
        let sessions = Arc::new(SessionStore::new(
            repos.sessions.clone(),
            config.session_ttl_hours,
            config.session_cache_ttl_secs,
        ));
        let gate = Arc::new(AuthGate::new(
            Arc::clone(&sessions),
            Arc::new(policy),
            config.public_paths.clone(),
        ));
        let verifier = Arc::new(EmailVerifier::new(
            sender,
            config.verification_code_ttl_mins,
        ));

        Self {
            config: Arc::new(config),
            pool,
            repos,
            sessions,
            gate,
            verifier,
        }
    }
}
