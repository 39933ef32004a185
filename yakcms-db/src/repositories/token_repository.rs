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

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use yakcms_core::models::token::{AuthToken, TokenPurpose};

use super::{format_datetime, parse_datetime};

pub struct TokenRepository {
    pool: SqlitePool,
}

impl TokenRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, token: &AuthToken) -> Result<()> {
        sqlx::query(
            "INSERT INTO auth_tokens (token, email, purpose, expires_at, consumed) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&token.token)
        .bind(&token.email)
        .bind(token.purpose.as_str())
        .bind(format_datetime(token.expires_at))
        .bind(token.consumed)
        .execute(&self.pool)
        .await
        .context("Failed to create auth token")?;
        Ok(())
    }

    /// Look up a token that is unconsumed, unexpired, and issued for the
    /// given purpose.
    pub async fn find_usable(&self, token: &str, purpose: TokenPurpose) -> Result<Option<AuthToken>> {
        let row = sqlx::query_as::<_, (String, String, String, String, bool)>(
            r#"
            SELECT token, email, purpose, expires_at, consumed
            FROM auth_tokens
            WHERE token = ? AND purpose = ? AND consumed = 0 AND expires_at > ?
            "#,
        )
        .bind(token)
        .bind(purpose.as_str())
        .bind(format_datetime(Utc::now()))
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find auth token")?;

        match row {
            Some((token, email, purpose, expires_at, consumed)) => Ok(Some(AuthToken {
                token,
                email,
                purpose: TokenPurpose::parse(&purpose).map_err(anyhow::Error::msg)?,
                expires_at: parse_datetime(&expires_at, "expires_at")?,
                consumed,
            })),
            None => Ok(None),
        }
    }

    /// Tokens are single-use: mark it consumed so a replay finds nothing.
    pub async fn consume(&self, token: &str) -> Result<()> {
        sqlx::query("UPDATE auth_tokens SET consumed = 1 WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await
            .context("Failed to consume auth token")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init::create_schema;
    use chrono::Duration;

    async fn setup() -> Result<TokenRepository> {
        let pool = SqlitePool::connect(":memory:").await?;
        create_schema(&pool).await?;
        Ok(TokenRepository::new(pool))
    }

    #[sqlx::test]
    async fn test_create_find_consume() -> Result<()> {
        let repo = setup().await?;
        let token = AuthToken::new("jane@example.com", TokenPurpose::PasswordReset);
        repo.create(&token).await?;

        let found = repo
            .find_usable(&token.token, TokenPurpose::PasswordReset)
            .await?
            .expect("token should be usable");
        assert_eq!(found.email, "jane@example.com");

        repo.consume(&token.token).await?;
        assert!(repo
            .find_usable(&token.token, TokenPurpose::PasswordReset)
            .await?
            .is_none());
        Ok(())
    }

    #[sqlx::test]
    async fn test_wrong_purpose_is_unusable() -> Result<()> {
        let repo = setup().await?;
        let token = AuthToken::new("jane@example.com", TokenPurpose::EmailVerify);
        repo.create(&token).await?;

        assert!(repo
            .find_usable(&token.token, TokenPurpose::PasswordReset)
            .await?
            .is_none());
        Ok(())
    }

    #[sqlx::test]
    async fn test_expired_token_is_unusable() -> Result<()> {
        let repo = setup().await?;
        let mut token = AuthToken::new("jane@example.com", TokenPurpose::PasswordReset);
        token.expires_at = Utc::now() - Duration::minutes(1);
        repo.create(&token).await?;

        assert!(repo
            .find_usable(&token.token, TokenPurpose::PasswordReset)
            .await?
            .is_none());
        Ok(())
    }
}
