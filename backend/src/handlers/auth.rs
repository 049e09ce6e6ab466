//! HTTP handlers for authentication endpoints

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::external::EmailClient;
use crate::middleware::CurrentUser;
use crate::models::User;
use crate::services::auth::AuthTokens;
use crate::services::{AuthService, InventoryService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Register a new user account
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<Json<AuthTokens>> {
    let service = AuthService::new(state.db, &state.config);
    let tokens = service.register(&input.email, &input.password).await?;
    Ok(Json(tokens))
}

/// Login with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthTokens>> {
    let service = AuthService::new(state.db, &state.config);
    let tokens = service.login(&input.email, &input.password).await?;
    Ok(Json(tokens))
}

/// Exchange a refresh token for a new access token
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<AccessTokenResponse>> {
    let service = AuthService::new(state.db, &state.config);
    let (access_token, expires_in) = service.refresh_access_token(&input.refresh_token)?;
    Ok(Json(AccessTokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_in,
    }))
}

/// Get the authenticated user's profile
pub async fn me(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<User>> {
    let service = AuthService::new(state.db, &state.config);
    let user = service.get_user(current_user.0.user_id).await?;
    Ok(Json(user))
}

/// Change the authenticated user's password
pub async fn change_password(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let service = AuthService::new(state.db, &state.config);
    service
        .change_password(
            current_user.0.user_id,
            &input.current_password,
            &input.new_password,
        )
        .await?;
    Ok(Json(MessageResponse {
        message: "Password changed".to_string(),
    }))
}

/// Request a password reset email.
///
/// Responds identically whether or not the email has an account.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(input): Json<ForgotPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let service = AuthService::new(state.db.clone(), &state.config);

    if let Some((user, token)) = service.forgot_password(&input.email).await? {
        let email = EmailClient::new(
            state.config.email.api_endpoint.clone(),
            state.config.email.api_key.clone(),
            state.config.email.sender.clone(),
            state.config.email.app_url.clone(),
        );
        email.send_password_reset_email(&user.email, &token).await;
    }

    Ok(Json(MessageResponse {
        message: "If that email has an account, a reset link has been sent".to_string(),
    }))
}

/// Complete a password reset
pub async fn reset_password(
    State(state): State<AppState>,
    Json(input): Json<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let service = AuthService::new(state.db, &state.config);
    service.reset_password(&input.token, &input.new_password).await?;
    Ok(Json(MessageResponse {
        message: "Password reset".to_string(),
    }))
}

/// Delete the authenticated user's account.
///
/// Inventories where the user is the sole member are deleted with all their
/// contents; shared inventories only lose the membership.
pub async fn delete_account(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<MessageResponse>> {
    let service = InventoryService::new(state.db);
    service.delete_user(current_user.0.user_id).await?;
    Ok(Json(MessageResponse {
        message: "Account deleted".to_string(),
    }))
}
