//! Authentication endpoints.
//!
//! Registration, login (token issuance), profile read/update, and the
//! verification / password-reset flows.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use snapfeed_common::AppResult;
use snapfeed_core::{RegisterInput, UpdateUserInput};
use snapfeed_db::entities::user;

use crate::{extractors::AuthUser, middleware::AppState, response::Detail};

/// Account response (registration and login).
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: String,
    pub email: String,
    pub token: String,
}

impl From<user::Model> for AccountResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            token: user.token.unwrap_or_default(),
        }
    }
}

/// Profile response.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: String,
    pub email: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: String,
}

impl From<user::Model> for ProfileResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            is_active: user.is_active,
            is_verified: user.is_verified,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Create a new account.
async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> AppResult<Json<AccountResponse>> {
    let user = state.user_service.register(input).await?;
    Ok(Json(user.into()))
}

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Sign in with email and password.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<AccountResponse>> {
    let user = state.user_service.login(&req.email, &req.password).await?;
    Ok(Json(user.into()))
}

/// Read the authenticated user's profile.
async fn me(AuthUser(user): AuthUser) -> Json<ProfileResponse> {
    Json(user.into())
}

/// Update the authenticated user's profile.
async fn update_me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateUserInput>,
) -> AppResult<Json<ProfileResponse>> {
    let updated = state.user_service.update(&user.id, input).await?;
    Ok(Json(updated.into()))
}

/// Issue an email verification token for the authenticated user.
async fn request_verify_token(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Detail>> {
    state.user_service.request_verify_token(user).await?;
    Ok(Json(Detail::new("verification token issued")))
}

/// Verify request.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub token: String,
}

/// Confirm an email verification token.
async fn verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> AppResult<Json<ProfileResponse>> {
    let user = state.user_service.verify(&req.token).await?;
    Ok(Json(user.into()))
}

/// Forgot-password request.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Issue a password reset token. Always acknowledges, so callers cannot
/// probe which emails are registered.
async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> AppResult<Json<Detail>> {
    state.user_service.forgot_password(&req.email).await?;
    Ok(Json(Detail::new("reset token issued if the account exists")))
}

/// Reset-password request.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

/// Reset the password using a previously issued token.
async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> AppResult<Json<Detail>> {
    state
        .user_service
        .reset_password(&req.token, &req.password)
        .await?;
    Ok(Json(Detail::new("password updated")))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me).patch(update_me))
        .route("/request-verify-token", post(request_verify_token))
        .route("/verify", post(verify))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}
