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

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use yakcms_core::models::audit::AuditLogEntry;
use yakcms_core::CmsError;

use super::{format_datetime, parse_datetime};

/// Filters for [`AuditLogRepository::query`]. All optional; newest first.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub actor_id: Option<String>,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub action: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub struct AuditLogRepository {
    pool: SqlitePool,
}

type AuditRow = (
    String,         // id
    String,         // timestamp
    String,         // action
    String,         // actor_id
    String,         // resource_type
    Option<String>, // resource_id
    String,         // details (JSON)
    String,         // ip_address
);

const AUDIT_COLUMNS: &str =
    "id, timestamp, action, actor_id, resource_type, resource_id, details, ip_address";

impl AuditLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a batch of entries in one transaction. The audit log is
    /// append-only; existing rows are never touched.
    pub async fn insert_batch(&self, entries: &[AuditLogEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin audit transaction")?;

        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO audit_log (id, timestamp, action, actor_id, resource_type,
                                       resource_id, details, ip_address)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&entry.id)
            .bind(format_datetime(entry.timestamp))
            .bind(&entry.action)
            .bind(&entry.actor_id)
            .bind(&entry.resource_type)
            .bind(&entry.resource_id)
            .bind(serde_json::to_string(&entry.details)?)
            .bind(&entry.ip_address)
            .execute(&mut *tx)
            .await
            .context("Failed to insert audit entry")?;
        }

        tx.commit().await.context("Failed to commit audit batch")?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<AuditLogEntry>> {
        let row = sqlx::query_as::<_, AuditRow>(&format!(
            "SELECT {} FROM audit_log WHERE id = ?",
            AUDIT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find audit entry")?;

        row.map(from_row).transpose()
    }

    pub async fn query(&self, query: &AuditQuery) -> Result<Vec<AuditLogEntry>> {
        if let (Some(start), Some(end)) = (query.start, query.end) {
            if start > end {
                return Err(
                    CmsError::conflict("Date range start must not be after its end").into(),
                );
            }
        }

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM audit_log WHERE 1=1", AUDIT_COLUMNS));

        if let Some(actor_id) = &query.actor_id {
            qb.push(" AND actor_id = ").push_bind(actor_id);
        }
        if let Some(resource_type) = &query.resource_type {
            qb.push(" AND resource_type = ").push_bind(resource_type);
        }
        if let Some(resource_id) = &query.resource_id {
            qb.push(" AND resource_id = ").push_bind(resource_id);
        }
        if let Some(action) = &query.action {
            qb.push(" AND action = ").push_bind(action);
        }
        if let Some(start) = query.start {
            qb.push(" AND timestamp >= ").push_bind(format_datetime(start));
        }
        if let Some(end) = query.end {
            qb.push(" AND timestamp <= ").push_bind(format_datetime(end));
        }

        qb.push(" ORDER BY timestamp DESC");
        qb.push(" LIMIT ").push_bind(query.limit.unwrap_or(100));
        qb.push(" OFFSET ").push_bind(query.offset.unwrap_or(0));

        let rows = qb
            .build_query_as::<AuditRow>()
            .fetch_all(&self.pool)
            .await
            .context("Failed to query audit log")?;

        rows.into_iter().map(from_row).collect()
    }
}

fn from_row(row: AuditRow) -> Result<AuditLogEntry> {
    let (id, timestamp, action, actor_id, resource_type, resource_id, details, ip_address) = row;

    Ok(AuditLogEntry {
        id,
        timestamp: parse_datetime(&timestamp, "timestamp")?,
        action,
        actor_id,
        resource_type,
        resource_id,
        details: serde_json::from_str(&details).context("Failed to parse audit details")?,
        ip_address,
    })
}
