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
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use yakcms_core::error::CmsError;
use yakcms_core::models::audit::AuditLogEntry;
use yakcms_core::models::media::MediaItem;
use yakcms_db::{MediaRepository, PostRepository};

use crate::error::AppError;
use crate::handlers::RequestMeta;
use crate::state::AppState;
use crate::uploads;

#[derive(Debug, Deserialize)]
pub struct ListMediaQuery {
    /// MIME type prefix filter, e.g. "image/".
    pub mime: Option<String>,
}

pub async fn list_media(
    State(state): State<AppState>,
    Query(query): Query<ListMediaQuery>,
) -> Result<Json<Vec<MediaItem>>, AppError> {
    let items = MediaRepository::new(state.db.clone())
        .list(query.mime.as_deref())
        .await?;
    Ok(Json(items))
}

pub async fn get_media(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MediaItem>, AppError> {
    let item = MediaRepository::new(state.db.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| CmsError::not_found("Media item not found"))?;
    Ok(Json(item))
}

/// Media referenced from any post body or cover image cannot be deleted.
pub async fn delete_media(
    State(state): State<AppState>,
    meta: RequestMeta,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let repository = MediaRepository::new(state.db.clone());
    let item = repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| CmsError::not_found("Media item not found"))?;

    let posts = PostRepository::new(state.db.clone());
    if posts.references_media(&item.path).await? {
        return Err(CmsError::conflict(format!(
            "Media file {} is still referenced by posts",
            item.path
        ))
        .into());
    }

    repository.delete(id).await?;
    uploads::remove_files(
        std::path::Path::new(&state.config.media_dir),
        &item.all_paths(),
    )?;

    state
        .audit
        .record(AuditLogEntry::new(
            "media.delete",
            &meta.actor_id,
            "media",
            Some(id.to_string()),
            json!({ "path": item.path }),
            &meta.ip_address,
        ))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
