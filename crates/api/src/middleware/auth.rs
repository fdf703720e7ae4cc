//! Bearer-token authentication and policy enforcement.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use hotel_core::error::CoreError;
use hotel_core::policy::{PathPattern, PolicyEngine};
use hotel_core::types::DbId;

use crate::auth::session::SessionStore;
use crate::error::AppError;
use crate::state::AppState;

/// The caller behind an admitted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: DbId,
    pub role: String,
    pub session_id: DbId,
}

/// Result of running a request through the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// The path is on the public allow-list; no identity is attached.
    Public,
    /// Token resolved and policy allowed the call.
    Forwarded(Identity),
}

/// Decides whether a request may reach its handler.
pub struct AuthGate {
    sessions: Arc<SessionStore>,
    policy: Arc<PolicyEngine>,
    public_paths: Vec<PathPattern>,
}

impl AuthGate {
    pub fn new(
        sessions: Arc<SessionStore>,
        policy: Arc<PolicyEngine>,
        public_paths: Vec<PathPattern>,
    ) -> Self {
        Self {
            sessions,
            policy,
            public_paths,
        }
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.public_paths.iter().any(|p| p.matches(path))
    }

    /// Run the gate for one request.
    ///
    /// Errors are `Unauthorized` (no usable token, or no live session) or
    /// `Forbidden` (policy denies the role), plus storage failures.
    pub async fn check(
        &self,
        headers: &HeaderMap,
        method: &Method,
        path: &str,
    ) -> Result<GateOutcome, AppError> {
        if self.is_public(path) {
            return Ok(GateOutcome::Public);
        }

        let token = bearer_token(headers).inspect_err(|err| {
            tracing::debug!(%method, path, reason = %err, "Request rejected");
        })?;

        let Some(session) = self.sessions.resolve(token).await? else {
            tracing::debug!(%method, path, reason = "unknown or expired session", "Request rejected");
            return Err(CoreError::Unauthorized("Invalid or expired session".into()).into());
        };

        if !self.policy.is_allowed(&session.role, path, method.as_str()) {
            tracing::debug!(
                %method,
                path,
                role = %session.role,
                reason = "policy denied",
                "Request rejected"
            );
            return Err(CoreError::Forbidden(format!(
                "Role '{}' may not {method} {path}",
                session.role
            ))
            .into());
        }

        Ok(GateOutcome::Forwarded(Identity {
            user_id: session.user_id,
            role: session.role,
            session_id: session.id,
        }))
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| CoreError::Unauthorized("Missing Authorization header".into()))?;

    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            )
        })?;
    Ok(token)
}

/// Middleware wrapping every route with [`AuthGate::check`].
pub async fn auth_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let outcome = state
        .gate
        .check(request.headers(), request.method(), request.uri().path())
        .await;

    match outcome {
        Ok(GateOutcome::Public) => next.run(request).await,
        Ok(GateOutcome::Forwarded(identity)) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

/// Authenticated caller, as attached by [`auth_gate`].
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = %user.user_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    pub role: String,
    pub session_id: DbId,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = parts.extensions.get::<Identity>().ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Authentication required".into()))
        })?;
        Ok(AuthUser {
            user_id: identity.user_id,
            role: identity.role.clone(),
            session_id: identity.session_id,
        })
    }
}
