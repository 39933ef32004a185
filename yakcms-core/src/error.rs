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

use thiserror::Error;

/// Domain error taxonomy shared by every layer.
///
/// The web layer maps these onto HTTP statuses; repositories raise them
/// through `anyhow::Error` so callers can downcast when the kind matters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CmsError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Too many requests")]
    RateLimited,
}

impl CmsError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_message() {
        let err = CmsError::conflict("Slug already exists");
        assert_eq!(err.to_string(), "Slug already exists");
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let err: anyhow::Error = CmsError::not_found("Post not found").into();
        let kind = err.downcast_ref::<CmsError>();
        assert_eq!(kind, Some(&CmsError::NotFound("Post not found".into())));
    }
}
