//! Auth endpoints: signup, login, token refresh, password reset.

use axum::{extract::State, routing::post, Json, Router};
use quill_common::AppResult;
use quill_core::services::{ResetConfirmInput, SignupInput, TokenPair};
use quill_db::entities::user;
use serde::{Deserialize, Serialize};

use crate::{middleware::AppState, response::{ApiResponse, Created}};

/// Public view of a user account.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub created_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

/// Register a new account.
async fn signup(
    State(state): State<AppState>,
    Json(input): Json<SignupInput>,
) -> AppResult<Created<UserResponse>> {
    let user = state.account_service.signup(input).await?;
    Ok(Created(user.into()))
}

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response: the user plus a token pair.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

/// Authenticate and issue tokens.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<ApiResponse<LoginResponse>> {
    let (user, pair) = state.account_service.login(&req.email, &req.password).await?;
    Ok(ApiResponse::ok(LoginResponse {
        user: user.into(),
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    }))
}

/// Token refresh request.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Exchange a refresh token for a new pair.
async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> AppResult<ApiResponse<TokenPair>> {
    let pair = state.account_service.refresh(&req.refresh_token)?;
    Ok(ApiResponse::ok(pair))
}

/// Password reset request.
#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

/// Request a password reset email.
async fn password_reset(
    State(state): State<AppState>,
    Json(req): Json<PasswordResetRequest>,
) -> AppResult<ApiResponse<()>> {
    state.account_service.request_password_reset(&req.email).await?;
    Ok(ApiResponse::ok(()))
}

/// Complete a password reset with the mailed token.
async fn password_reset_confirm(
    State(state): State<AppState>,
    Json(input): Json<ResetConfirmInput>,
) -> AppResult<ApiResponse<()>> {
    state.account_service.confirm_password_reset(input).await?;
    Ok(ApiResponse::ok(()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup/", post(signup))
        .route("/login/", post(login))
        .route("/token/refresh/", post(refresh))
        .route("/password-reset/", post(password_reset))
        .route("/password-reset-confirm/", post(password_reset_confirm))
}
