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
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use yakcms_core::error::CmsError;
use yakcms_core::models::audit::AuditLogEntry;
use yakcms_db::repositories::AuditQuery;
use yakcms_db::AuditLogRepository;

use crate::error::AppError;
use crate::handlers::RequestMeta;
use crate::state::AppState;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditFilterParams {
    pub actor_id: Option<String>,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub action: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl From<AuditFilterParams> for AuditQuery {
    fn from(params: AuditFilterParams) -> Self {
        AuditQuery {
            actor_id: params.actor_id,
            resource_type: params.resource_type,
            resource_id: params.resource_id,
            action: params.action,
            start: params.start,
            end: params.end,
            limit: params.limit,
            offset: params.offset,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NewEntryInput {
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    #[serde(default)]
    pub details: Value,
}

/// List entries, newest first. The in-memory buffer is flushed first so
/// a query right after a mutation sees it.
pub async fn list_entries(
    State(state): State<AppState>,
    Query(params): Query<AuditFilterParams>,
) -> Result<Json<Vec<AuditLogEntry>>, AppError> {
    state.audit.flush().await?;
    let entries = AuditLogRepository::new(state.db.clone())
        .query(&params.into())
        .await?;
    Ok(Json(entries))
}

pub async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AuditLogEntry>, AppError> {
    state.audit.flush().await?;
    let entry = AuditLogRepository::new(state.db.clone())
        .find_by_id(&id)
        .await?
        .ok_or_else(|| CmsError::not_found("Audit log entry not found"))?;
    Ok(Json(entry))
}

/// Record an application-level event on behalf of the caller.
pub async fn create_entry(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(input): Json<NewEntryInput>,
) -> Result<(StatusCode, Json<AuditLogEntry>), AppError> {
    let entry = AuditLogEntry::new(
        input.action,
        meta.actor_id,
        input.resource_type,
        input.resource_id,
        input.details,
        meta.ip_address,
    );
    state.audit.record(entry.clone()).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Filtered JSON export of the audit trail. Export itself is audited.
pub async fn export_entries(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(params): Json<AuditFilterParams>,
) -> Result<Json<Value>, AppError> {
    state.audit.flush().await?;
    let repository = AuditLogRepository::new(state.db.clone());
    let mut query: AuditQuery = params.clone().into();
    if query.limit.is_none() {
        // Exports default to the whole (bounded) trail, not the list page size
        query.limit = Some(10_000);
    }
    let entries = repository.query(&query).await?;

    state
        .audit
        .record(AuditLogEntry::new(
            "audit.export",
            &meta.actor_id,
            "audit",
            None,
            json!({ "count": entries.len(), "action_filter": params.action }),
            &meta.ip_address,
        ))
        .await?;

    Ok(Json(json!({
        "exported_at": Utc::now(),
        "count": entries.len(),
        "entries": entries,
    })))
}
