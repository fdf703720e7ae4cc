//! Handlers for the `/auth` resource (register, verify-email, login, logout).

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use hotel_core::error::CoreError;
use hotel_core::roles::{ROLE_GUEST, STATUS_ACTIVE, STATUS_BLOCKED, STATUS_PENDING};
use hotel_core::types::Timestamp;
use hotel_db::models::user::{CreateUser, User, UserLookup};
use serde::{Deserialize, Serialize};

use super::user::hash_new_password;
use crate::auth::password::verify_password;
use crate::auth::session::ClientInfo;
use crate::error::{AppError, AppResult};
use crate::extract::Json;
use crate::middleware::auth::{bearer_token, AuthUser};
use crate::state::AppState;

/// `user_type` given to self-registered accounts.
const SELF_REGISTERED_USER_TYPE: &str = "customer";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /v1/auth/register`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub full_name: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub password: String,
    #[serde(default)]
    pub gender: String,
}

/// Request body for `POST /v1/auth/verify-email`.
#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    pub email: String,
    pub code: String,
}

/// Request body for `POST /v1/auth/login`. `login` is a username or e-mail.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: Timestamp,
    pub user: User,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/auth/register
///
/// Creates a pending guest account and sends a verification code. If the
/// code cannot be sent the account is removed again, so the caller may retry.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let password_hash = hash_new_password(&input.password)?;
    let user = state
        .repos
        .users
        .create(&CreateUser {
            full_name: input.full_name,
            username: input.username,
            email: input.email,
            phone: input.phone,
            password_hash,
            user_type: SELF_REGISTERED_USER_TYPE.to_string(),
            role: ROLE_GUEST.to_string(),
            status: STATUS_PENDING.to_string(),
            gender: input.gender,
        })
        .await?;

    if let Err(err) = state.verifier.issue(&user.email).await {
        tracing::warn!(
            user_id = %user.id,
            error = %err,
            "Verification code not sent, registration rolled back"
        );
        state.repos.delete_user(user.id).await?;
        return Err(err.into());
    }
    tracing::info!(user_id = %user.id, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /v1/auth/verify-email
///
/// Consumes the code and activates the account.
pub async fn verify_email(
    State(state): State<AppState>,
    Json(input): Json<VerifyEmailRequest>,
) -> AppResult<Json<User>> {
    state.verifier.confirm(&input.email, &input.code).await?;

    let user = state
        .repos
        .users
        .get_single(&UserLookup {
            email: Some(input.email),
            ..UserLookup::default()
        })
        .await?;
    if user.status == STATUS_BLOCKED {
        return Err(CoreError::Forbidden("Account is blocked".into()).into());
    }

    let user = state.repos.users.set_status(user.id, STATUS_ACTIVE).await?;
    tracing::info!(user_id = %user.id, "E-mail verified");
    Ok(Json(user))
}

/// POST /v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let user = state
        .repos
        .users
        .find_by_login(&input.login)
        .await?
        .ok_or_else(invalid_credentials)?;

    let valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !valid {
        tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(invalid_credentials());
    }

    if user.status != STATUS_ACTIVE {
        return Err(CoreError::Forbidden(format!("Account is {}", user.status)).into());
    }

    let issued = state
        .sessions
        .create(user.id, &user.role, client_info(&headers))
        .await?;

    Ok(Json(LoginResponse {
        access_token: issued.token,
        token_type: "Bearer",
        expires_at: issued.session.expires_at,
        user,
    }))
}

/// POST /v1/auth/logout
///
/// Ends the session behind the presented token.
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
) -> AppResult<StatusCode> {
    let token = bearer_token(&headers)?;
    state.sessions.invalidate(token).await?;
    tracing::info!(user_id = %user.user_id, session_id = %user.session_id, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn invalid_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized("Invalid login or password".into()))
}

/// User agent and client address from the request headers. The first
/// `X-Forwarded-For` hop wins over `X-Real-IP`.
fn client_info(headers: &HeaderMap) -> ClientInfo {
    let text = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    ClientInfo {
        user_agent: text(header::USER_AGENT.as_str()),
        ip_address: text("x-forwarded-for")
            .and_then(|v| v.split(',').next().map(|s| s.trim().to_string()))
            .or_else(|| text("x-real-ip")),
    }
}
