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
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use yakcms_core::error::CmsError;
use yakcms_core::models::audit::AuditLogEntry;
use yakcms_core::models::author::{Author, AuthorRole};
use yakcms_db::AuthorRepository;

use crate::error::AppError;
use crate::handlers::RequestMeta;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AuthorInput {
    pub name: String,
    pub email: String,
    pub role: Option<AuthorRole>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

pub async fn list_authors(State(state): State<AppState>) -> Result<Json<Vec<Author>>, AppError> {
    let authors = AuthorRepository::new(state.db.clone()).list().await?;
    Ok(Json(authors))
}

pub async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Author>, AppError> {
    let author = AuthorRepository::new(state.db.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| CmsError::not_found("Author not found"))?;
    Ok(Json(author))
}

pub async fn create_author(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(input): Json<AuthorInput>,
) -> Result<(StatusCode, Json<Author>), AppError> {
    let role = input.role.unwrap_or(AuthorRole::Contributor);
    let mut author = Author::new(input.name, input.email, role);
    author.bio = input.bio;
    author.avatar = input.avatar;
    author.is_valid().map_err(CmsError::validation)?;

    let id = AuthorRepository::new(state.db.clone())
        .create(&author)
        .await?;
    author.id = Some(id);

    state
        .audit
        .record(AuditLogEntry::new(
            "author.create",
            &meta.actor_id,
            "author",
            Some(id.to_string()),
            json!({ "email": author.email, "role": author.role.as_str() }),
            &meta.ip_address,
        ))
        .await?;

    Ok((StatusCode::CREATED, Json(author)))
}

pub async fn update_author(
    State(state): State<AppState>,
    meta: RequestMeta,
    Path(id): Path<i64>,
    Json(input): Json<AuthorInput>,
) -> Result<Json<Author>, AppError> {
    let repository = AuthorRepository::new(state.db.clone());
    let mut author = repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| CmsError::not_found("Author not found"))?;

    author.name = input.name;
    author.email = input.email;
    if let Some(role) = input.role {
        author.role = role;
    }
    author.bio = input.bio;
    author.avatar = input.avatar;
    author.is_valid().map_err(CmsError::validation)?;

    repository.update(&author).await?;

    state
        .audit
        .record(AuditLogEntry::new(
            "author.update",
            &meta.actor_id,
            "author",
            Some(id.to_string()),
            json!({ "email": author.email, "role": author.role.as_str() }),
            &meta.ip_address,
        ))
        .await?;

    Ok(Json(author))
}

/// Deleting the last admin is forbidden; the repository enforces the guard.
pub async fn delete_author(
    State(state): State<AppState>,
    meta: RequestMeta,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    AuthorRepository::new(state.db.clone()).delete(id).await?;

    state
        .audit
        .record(AuditLogEntry::new(
            "author.delete",
            &meta.actor_id,
            "author",
            Some(id.to_string()),
            json!({}),
            &meta.ip_address,
        ))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
