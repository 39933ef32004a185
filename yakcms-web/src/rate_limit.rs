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
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{clock::DefaultClock, state::InMemoryState, state::NotKeyed, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use yakcms_core::error::CmsError;

use crate::error::AppError;
use crate::state::AppState;

pub type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Create a rate limiter allowing `max_requests` per minute.
pub fn create_rate_limiter(max_requests: u32) -> SharedRateLimiter {
    let quota = match NonZeroU32::new(max_requests) {
        Some(n) => Quota::per_minute(n),
        None => {
            // If zero is passed, default to 1 to avoid panic
            Quota::per_minute(NonZeroU32::new(1).unwrap())
        }
    };
    Arc::new(RateLimiter::direct(quota))
}

/// Rate limiting for the general API surface
pub async fn api_rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    match state.api_rate_limiter.check() {
        Ok(_) => Ok(next.run(request).await),
        Err(_) => Err(CmsError::RateLimited.into()),
    }
}

/// Stricter rate limiting for authentication endpoints
pub async fn auth_rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    match state.auth_rate_limiter.check() {
        Ok(_) => Ok(next.run(request).await),
        Err(_) => {
            tracing::warn!(path = %request.uri().path(), "Rate limit exceeded for auth endpoint");
            Err(CmsError::RateLimited.into())
        }
    }
}
