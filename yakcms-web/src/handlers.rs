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

use axum::{extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;

pub mod audit;
pub mod auth;
pub mod authors;
pub mod backups;
pub mod media;
pub mod posts;
pub mod upload;

/// Who performed the request, for audit attribution. Identity is carried
/// by a trusted proxy in front of this service; an absent header means an
/// anonymous actor, never a rejected request.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub actor_id: String,
    pub ip_address: String,
}

impl<S> FromRequestParts<S> for RequestMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor_id = parts
            .headers
            .get("x-actor-id")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or("anonymous")
            .to_string();
        let ip_address = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "unknown".to_string());
        Ok(Self {
            actor_id,
            ip_address,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use pretty_assertions::assert_eq;

    async fn meta_for(request: Request<()>) -> RequestMeta {
        let (mut parts, _) = request.into_parts();
        RequestMeta::from_request_parts(&mut parts, &())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_defaults_to_anonymous() {
        let meta = meta_for(Request::builder().body(()).unwrap()).await;
        assert_eq!(meta.actor_id, "anonymous");
        assert_eq!(meta.ip_address, "unknown");
    }

    #[tokio::test]
    async fn test_reads_actor_and_first_forwarded_ip() {
        let request = Request::builder()
            .header("x-actor-id", "jane")
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(())
            .unwrap();
        let meta = meta_for(request).await;
        assert_eq!(meta.actor_id, "jane");
        assert_eq!(meta.ip_address, "203.0.113.7");
    }
}
