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
use sqlx::SqlitePool;
use yakcms_core::models::backup::{BackupMetadata, BackupStatus, BackupType};
use yakcms_core::CmsError;

use super::{format_datetime, parse_datetime};

pub struct BackupRepository {
    pool: SqlitePool,
}

type BackupRow = (
    String, // id
    String, // created_at
    String, // backup_type
    i64,    // size
    String, // created_by
    String, // status
    String, // path
);

const BACKUP_COLUMNS: &str = "id, created_at, backup_type, size, created_by, status, path";

impl BackupRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, meta: &BackupMetadata) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO backups (id, created_at, backup_type, size, created_by, status, path)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&meta.id)
        .bind(format_datetime(meta.created_at))
        .bind(meta.backup_type.as_str())
        .bind(meta.size)
        .bind(&meta.created_by)
        .bind(meta.status.as_str())
        .bind(&meta.path)
        .execute(&self.pool)
        .await
        .context("Failed to create backup metadata")?;
        Ok(())
    }

    /// Record the outcome of an archive run. The pending record always
    /// transitions exactly once, to completed or failed.
    pub async fn set_status(&self, id: &str, status: BackupStatus, size: i64) -> Result<()> {
        let result = sqlx::query("UPDATE backups SET status = ?, size = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(size)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update backup status")?;

        if result.rows_affected() == 0 {
            return Err(CmsError::not_found("Backup not found").into());
        }
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<BackupMetadata>> {
        let row = sqlx::query_as::<_, BackupRow>(&format!(
            "SELECT {} FROM backups WHERE id = ?",
            BACKUP_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find backup")?;

        row.map(from_row).transpose()
    }

    /// All backups, newest first.
    pub async fn list(&self) -> Result<Vec<BackupMetadata>> {
        let rows = sqlx::query_as::<_, BackupRow>(&format!(
            "SELECT {} FROM backups ORDER BY created_at DESC",
            BACKUP_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list backups")?;

        rows.into_iter().map(from_row).collect()
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM backups WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete backup metadata")?;

        if result.rows_affected() == 0 {
            return Err(CmsError::not_found("Backup not found").into());
        }
        Ok(())
    }
}

fn from_row(row: BackupRow) -> Result<BackupMetadata> {
    let (id, created_at, backup_type, size, created_by, status, path) = row;

    Ok(BackupMetadata {
        id,
        created_at: parse_datetime(&created_at, "created_at")?,
        backup_type: BackupType::parse(&backup_type).map_err(anyhow::Error::msg)?,
        size,
        created_by,
        status: BackupStatus::parse(&status).map_err(anyhow::Error::msg)?,
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init::create_schema;
    use pretty_assertions::assert_eq;

    async fn setup() -> Result<BackupRepository> {
        let pool = SqlitePool::connect(":memory:").await?;
        create_schema(&pool).await?;
        Ok(BackupRepository::new(pool))
    }

    #[sqlx::test]
    async fn test_lifecycle_pending_to_completed() -> Result<()> {
        let repo = setup().await?;
        let meta = BackupMetadata::new(BackupType::Full, "jane");
        repo.create(&meta).await?;

        repo.set_status(&meta.id, BackupStatus::Completed, 4096).await?;
        let stored = repo.find_by_id(&meta.id).await?.unwrap();
        assert_eq!(stored.status, BackupStatus::Completed);
        assert_eq!(stored.size, 4096);
        Ok(())
    }

    #[sqlx::test]
    async fn test_failed_backup_keeps_record() -> Result<()> {
        let repo = setup().await?;
        let meta = BackupMetadata::new(BackupType::Media, "jane");
        repo.create(&meta).await?;

        repo.set_status(&meta.id, BackupStatus::Failed, 0).await?;
        let stored = repo.find_by_id(&meta.id).await?.unwrap();
        assert_eq!(stored.status, BackupStatus::Failed);
        Ok(())
    }

    #[sqlx::test]
    async fn test_list_newest_first() -> Result<()> {
        let repo = setup().await?;
        let mut older = BackupMetadata::new(BackupType::Content, "jane");
        older.created_at = older.created_at - chrono::Duration::hours(1);
        let newer = BackupMetadata::new(BackupType::Full, "jane");
        repo.create(&older).await?;
        repo.create(&newer).await?;

        let all = repo.list().await?;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, newer.id);
        Ok(())
    }

    #[sqlx::test]
    async fn test_delete_unknown_is_not_found() -> Result<()> {
        let repo = setup().await?;
        let err = repo.delete("missing").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CmsError>(),
            Some(CmsError::NotFound(_))
        ));
        Ok(())
    }
}
