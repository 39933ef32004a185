// YakCMS - A content management backend built with Rust
// Copyright (C) 2025 YakCMS Project Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Credential lifecycle endpoints. Tokens are returned in the response
//! body because delivery (email) happens outside this service.

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use yakcms_core::error::CmsError;
use yakcms_core::models::audit::AuditLogEntry;
use yakcms_core::models::author::Author;
use yakcms_core::models::token::{AuthToken, TokenPurpose};
use yakcms_db::{AuthorRepository, TokenRepository};

use crate::auth;
use crate::error::AppError;
use crate::handlers::RequestMeta;
use crate::state::AppState;

const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Deserialize)]
pub struct EmailInput {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordInput {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailInput {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct TotpVerifyInput {
    pub email: String,
    pub code: String,
}

async fn find_author(state: &AppState, email: &str) -> Result<Author, AppError> {
    AuthorRepository::new(state.db.clone())
        .find_by_email(email)
        .await?
        .ok_or_else(|| CmsError::not_found("Author not found").into())
}

async fn issue_token(
    state: &AppState,
    meta: &RequestMeta,
    email: &str,
    purpose: TokenPurpose,
) -> Result<AuthToken, AppError> {
    let author = find_author(state, email).await?;
    let token = AuthToken::new(&author.email, purpose);
    TokenRepository::new(state.db.clone()).create(&token).await?;

    state
        .audit
        .record(AuditLogEntry::new(
            "auth.token_issued",
            &meta.actor_id,
            "author",
            author.id.map(|id| id.to_string()),
            json!({ "purpose": purpose.as_str() }),
            &meta.ip_address,
        ))
        .await?;
    Ok(token)
}

async fn consume_token(
    state: &AppState,
    token: &str,
    purpose: TokenPurpose,
) -> Result<AuthToken, AppError> {
    let repository = TokenRepository::new(state.db.clone());
    let found = repository
        .find_usable(token, purpose)
        .await?
        .ok_or_else(|| CmsError::validation("Invalid or expired token"))?;
    repository.consume(token).await?;
    Ok(found)
}

/// Issue a single-use password reset token.
pub async fn request_password_reset(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(input): Json<EmailInput>,
) -> Result<Json<Value>, AppError> {
    let token = issue_token(&state, &meta, &input.email, TokenPurpose::PasswordReset).await?;
    Ok(Json(json!({
        "token": token.token,
        "expires_at": token.expires_at,
    })))
}

/// Consume a reset token and set the new password.
pub async fn reset_password(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(input): Json<ResetPasswordInput>,
) -> Result<Json<Value>, AppError> {
    if input.password.len() < MIN_PASSWORD_LENGTH {
        return Err(CmsError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        ))
        .into());
    }

    let token = consume_token(&state, &input.token, TokenPurpose::PasswordReset).await?;
    let mut author = find_author(&state, &token.email).await?;
    author.password_hash = Some(auth::hash_password(&input.password)?);
    AuthorRepository::new(state.db.clone())
        .update(&author)
        .await?;

    state
        .audit
        .record(AuditLogEntry::new(
            "auth.password_reset",
            &meta.actor_id,
            "author",
            author.id.map(|id| id.to_string()),
            json!({}),
            &meta.ip_address,
        ))
        .await?;

    Ok(Json(json!({ "message": "Password updated" })))
}

/// Issue a single-use email verification token.
pub async fn request_email_verification(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(input): Json<EmailInput>,
) -> Result<Json<Value>, AppError> {
    let token = issue_token(&state, &meta, &input.email, TokenPurpose::EmailVerify).await?;
    Ok(Json(json!({
        "token": token.token,
        "expires_at": token.expires_at,
    })))
}

/// Consume a verification token and mark the email verified.
pub async fn verify_email(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(input): Json<VerifyEmailInput>,
) -> Result<Json<Value>, AppError> {
    let token = consume_token(&state, &input.token, TokenPurpose::EmailVerify).await?;
    let mut author = find_author(&state, &token.email).await?;
    author.email_verified = true;
    AuthorRepository::new(state.db.clone())
        .update(&author)
        .await?;

    state
        .audit
        .record(AuditLogEntry::new(
            "auth.email_verified",
            &meta.actor_id,
            "author",
            author.id.map(|id| id.to_string()),
            json!({}),
            &meta.ip_address,
        ))
        .await?;

    Ok(Json(json!({ "message": "Email verified" })))
}

/// Generate and store a TOTP secret. 2FA stays disabled until a code is
/// verified against the secret.
pub async fn totp_setup(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(input): Json<EmailInput>,
) -> Result<Json<Value>, AppError> {
    let mut author = find_author(&state, &input.email).await?;
    let secret = auth::generate_totp_secret();
    let url = auth::totp_provisioning_url(&secret, &author.email)?;

    author.totp_secret = Some(secret.clone());
    author.totp_enabled = false;
    AuthorRepository::new(state.db.clone())
        .update(&author)
        .await?;

    state
        .audit
        .record(AuditLogEntry::new(
            "auth.2fa_setup",
            &meta.actor_id,
            "author",
            author.id.map(|id| id.to_string()),
            json!({}),
            &meta.ip_address,
        ))
        .await?;

    Ok(Json(json!({
        "secret": secret,
        "otpauth_url": url,
    })))
}

/// Verify a code against the pending secret and enable 2FA.
pub async fn totp_verify(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(input): Json<TotpVerifyInput>,
) -> Result<Json<Value>, AppError> {
    let mut author = find_author(&state, &input.email).await?;
    let secret = author
        .totp_secret
        .clone()
        .ok_or_else(|| CmsError::validation("2FA setup has not been started"))?;

    if !auth::verify_totp_code(&secret, &author.email, &input.code)? {
        return Err(CmsError::validation("Invalid verification code").into());
    }

    author.totp_enabled = true;
    AuthorRepository::new(state.db.clone())
        .update(&author)
        .await?;

    state
        .audit
        .record(AuditLogEntry::new(
            "auth.2fa_enabled",
            &meta.actor_id,
            "author",
            author.id.map(|id| id.to_string()),
            json!({}),
            &meta.ip_address,
        ))
        .await?;

    Ok(Json(json!({ "enabled": true })))
}
