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

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use yakcms_core::error::CmsError;
use yakcms_core::schedule::ScheduleError;

/// Application error type that includes context for better debugging
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<String>,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(details) = &self.details {
            write!(f, "{}: {}", self.message, details)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                status = ?self.status,
                message = %self.message,
                details = ?self.details,
                "Request failed"
            );
        } else {
            tracing::debug!(
                status = ?self.status,
                message = %self.message,
                "Request rejected"
            );
        }

        // Clients only ever see the message, never the details
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<CmsError> for AppError {
    fn from(err: CmsError) -> Self {
        let status = match &err {
            CmsError::Validation(_) => StatusCode::BAD_REQUEST,
            CmsError::NotFound(_) => StatusCode::NOT_FOUND,
            CmsError::Conflict(_) => StatusCode::CONFLICT,
            CmsError::Forbidden(_) => StatusCode::FORBIDDEN,
            CmsError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            CmsError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        };
        Self::new(status, err.to_string())
    }
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        Self::bad_request(err.to_string())
    }
}

// Conversion from anyhow::Error. Repositories raise CmsError through
// anyhow, so recover it here before falling back to a 500.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<CmsError>() {
            Ok(cms) => cms.into(),
            Err(err) => {
                tracing::error!("Anyhow error: {:?}", err);
                Self::internal_server_error("Internal server error")
                    .with_details(format!("{:?}", err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_app_error_display() {
        let err = AppError::not_found("Post not found");
        assert_eq!(err.to_string(), "Post not found");

        let err = AppError::internal_server_error("boom").with_details("stack");
        assert_eq!(err.to_string(), "boom: stack");
    }

    #[test]
    fn test_cms_error_status_mapping() {
        let err: AppError = CmsError::validation("Title is required").into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err: AppError = CmsError::not_found("Post not found").into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err: AppError = CmsError::conflict("Slug already exists").into();
        assert_eq!(err.status, StatusCode::CONFLICT);

        let err: AppError = CmsError::forbidden("Cannot delete last admin author").into();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let err: AppError = CmsError::RateLimited.into();
        assert_eq!(err.status, StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_anyhow_downcast_recovers_cms_error() {
        let source: anyhow::Error = CmsError::conflict("Post was modified").into();
        let err: AppError = source.into();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.message, "Post was modified");
    }

    #[test]
    fn test_anyhow_context_is_hidden_from_clients() {
        use anyhow::Context;

        let source: Result<(), std::io::Error> = Err(std::io::Error::other("disk on fire"));
        let err: AppError = source.context("Failed to write post").unwrap_err().into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Internal server error");
        assert!(err.details.unwrap().contains("Failed to write post"));
    }

    #[test]
    fn test_schedule_error_maps_to_bad_request() {
        let err: AppError = ScheduleError::PastSchedule.into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Please select a future date and time");
    }
}
