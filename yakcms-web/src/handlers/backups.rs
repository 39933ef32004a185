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
use serde_json::{json, Value};
use yakcms_core::models::backup::{BackupMetadata, BackupType};

use crate::error::AppError;
use crate::handlers::RequestMeta;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateBackupInput {
    #[serde(rename = "type")]
    pub backup_type: BackupType,
}

pub async fn list_backups(
    State(state): State<AppState>,
) -> Result<Json<Vec<BackupMetadata>>, AppError> {
    Ok(Json(state.backups.list().await?))
}

pub async fn get_backup(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BackupMetadata>, AppError> {
    Ok(Json(state.backups.get(&id).await?))
}

/// Runs the archive to completion; a failed archive still answers 201
/// with status "failed" so the failure is part of the registry.
pub async fn create_backup(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(input): Json<CreateBackupInput>,
) -> Result<(StatusCode, Json<BackupMetadata>), AppError> {
    let backup = state
        .backups
        .create(input.backup_type, &meta.actor_id, &meta.ip_address)
        .await?;
    Ok((StatusCode::CREATED, Json(backup)))
}

pub async fn delete_backup(
    State(state): State<AppState>,
    meta: RequestMeta,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state
        .backups
        .delete(&id, &meta.actor_id, &meta.ip_address)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Acknowledge a restore request. Extraction is an operator action
/// outside this service; the API validates and records the intent.
pub async fn restore_backup(
    State(state): State<AppState>,
    meta: RequestMeta,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let backup = state
        .backups
        .restore(&id, &meta.actor_id, &meta.ip_address)
        .await?;
    Ok(Json(json!({
        "acknowledged": true,
        "backup": backup,
    })))
}
