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

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    PasswordReset,
    EmailVerify,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::PasswordReset => "password_reset",
            TokenPurpose::EmailVerify => "email_verify",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "password_reset" => Ok(TokenPurpose::PasswordReset),
            "email_verify" => Ok(TokenPurpose::EmailVerify),
            other => Err(format!("Invalid token purpose: {}", other)),
        }
    }
}

/// Single-use credential sent out of band for password reset or
/// email verification. Valid for ten minutes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthToken {
    pub token: String,
    pub email: String,
    pub purpose: TokenPurpose,
    pub expires_at: DateTime<Utc>,
    pub consumed: bool,
}

impl AuthToken {
    pub const TTL_MINUTES: i64 = 10;

    pub fn new(email: impl Into<String>, purpose: TokenPurpose) -> Self {
        Self {
            token: Uuid::new_v4().to_string(),
            email: email.into(),
            purpose,
            expires_at: Utc::now() + Duration::minutes(Self::TTL_MINUTES),
            consumed: false,
        }
    }

    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        !self.consumed && self.expires_at > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_token_is_usable() {
        let token = AuthToken::new("jane@example.com", TokenPurpose::PasswordReset);
        assert!(token.is_usable_at(Utc::now()));
    }

    #[test]
    fn test_expired_or_consumed_is_unusable() {
        let mut token = AuthToken::new("jane@example.com", TokenPurpose::EmailVerify);
        assert!(!token.is_usable_at(Utc::now() + Duration::minutes(11)));

        token.consumed = true;
        assert!(!token.is_usable_at(Utc::now()));
    }
}
