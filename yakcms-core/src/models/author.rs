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

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Failed to compile email regex"));

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthorRole {
    Admin,
    Editor,
    Contributor,
}

impl AuthorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorRole::Admin => "admin",
            AuthorRole::Editor => "editor",
            AuthorRole::Contributor => "contributor",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "admin" => Ok(AuthorRole::Admin),
            "editor" => Ok(AuthorRole::Editor),
            "contributor" => Ok(AuthorRole::Contributor),
            other => Err(format!("Invalid author role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Author {
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    pub role: AuthorRole,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub email_verified: bool,
    #[serde(skip_serializing)]
    pub totp_secret: Option<String>,
    pub totp_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Author {
    pub fn new(name: String, email: String, role: AuthorRole) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            name,
            email,
            role,
            bio: None,
            avatar: None,
            password_hash: None,
            email_verified: false,
            totp_secret: None,
            totp_enabled: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate_name(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Name and email are required".to_string());
        }
        Ok(())
    }

    pub fn validate_email(&self) -> Result<(), String> {
        if self.email.trim().is_empty() {
            return Err("Name and email are required".to_string());
        }
        if !EMAIL_REGEX.is_match(&self.email) {
            return Err("Invalid email format".to_string());
        }
        Ok(())
    }

    pub fn is_valid(&self) -> Result<(), String> {
        self.validate_name()?;
        self.validate_email()?;
        Ok(())
    }

    pub fn is_admin(&self) -> bool {
        self.role == AuthorRole::Admin
    }
}
