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
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use std::path::Path;
use yakcms_core::error::CmsError;
use yakcms_core::models::audit::AuditLogEntry;
use yakcms_core::models::media::MediaItem;
use yakcms_db::MediaRepository;

use crate::error::AppError;
use crate::handlers::RequestMeta;
use crate::state::AppState;
use crate::uploads;

/// Accept a multipart image upload. The `file` field carries the image;
/// an optional `generate_sizes` field ("true") requests derived variants.
/// The format is detected from content, so a mislabeled executable is
/// rejected no matter what MIME type the client declares.
pub async fn upload_media(
    State(state): State<AppState>,
    meta: RequestMeta,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<MediaItem>), AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut generate_sizes = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("Invalid multipart request: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                let original_name = field
                    .file_name()
                    .unwrap_or("upload")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::bad_request(format!("Failed to read upload: {}", e)))?;
                upload = Some((original_name, data.to_vec()));
            }
            Some("generate_sizes") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::bad_request(format!("Invalid field: {}", e)))?;
                generate_sizes = value == "true" || value == "1";
            }
            _ => {}
        }
    }

    let (original_name, data) =
        upload.ok_or_else(|| CmsError::validation("No file field in upload"))?;
    if data.len() > state.config.max_upload_size {
        return Err(CmsError::PayloadTooLarge(format!(
            "Upload exceeds the {} byte limit",
            state.config.max_upload_size
        ))
        .into());
    }

    let metadata =
        uploads::extract_image_metadata(&data).map_err(|e| CmsError::validation(e.to_string()))?;

    let media_dir = Path::new(&state.config.media_dir);
    let stored_name = uploads::generate_unique_filename(metadata.format);
    let stored_path = uploads::save_upload(&data, media_dir, &stored_name)?;

    let mut item = MediaItem::new(
        original_name,
        stored_path,
        metadata.format.mime_type().to_string(),
        metadata.size as i64,
        meta.actor_id.clone(),
    );
    item.width = metadata.width;
    item.height = metadata.height;
    item.format = Some(metadata.format.extension().to_string());

    if generate_sizes {
        item.variants = uploads::generate_variants(&data, media_dir, &stored_name, metadata.format)?;
    }

    let id = MediaRepository::new(state.db.clone()).create(&item).await?;
    item.id = Some(id);

    state
        .audit
        .record(AuditLogEntry::new(
            "media.upload",
            &meta.actor_id,
            "media",
            Some(id.to_string()),
            json!({
                "filename": item.filename,
                "path": item.path,
                "size": item.size,
                "variants": !item.variants.is_empty(),
            }),
            &meta.ip_address,
        ))
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}
