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
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::json;
use sqlx::SqlitePool;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;
use yakcms_core::error::CmsError;
use yakcms_core::models::audit::AuditLogEntry;
use yakcms_core::models::backup::{BackupMetadata, BackupStatus, BackupType};
use yakcms_db::BackupRepository;

use crate::config::Config;
use crate::services::audit::AuditLogger;

/// Creates and tracks tar.gz archives of the content, media and config
/// directories. Archive work runs on the blocking pool; the metadata row
/// moves pending -> completed | failed and is kept either way.
pub struct BackupCoordinator {
    repository: BackupRepository,
    audit: Arc<AuditLogger>,
    content_dir: PathBuf,
    media_dir: PathBuf,
    config_dir: PathBuf,
    backup_dir: PathBuf,
}

impl BackupCoordinator {
    pub fn new(pool: SqlitePool, audit: Arc<AuditLogger>, config: &Config) -> Self {
        Self {
            repository: BackupRepository::new(pool),
            audit,
            content_dir: PathBuf::from(&config.content_dir),
            media_dir: PathBuf::from(&config.media_dir),
            config_dir: PathBuf::from(&config.config_dir),
            backup_dir: PathBuf::from(&config.backup_dir),
        }
    }

    /// Run a backup to completion. The returned metadata carries the final
    /// status, so a failed archive is visible to the caller rather than
    /// surfaced as a transport error.
    pub async fn create(
        &self,
        backup_type: BackupType,
        actor_id: &str,
        ip_address: &str,
    ) -> Result<BackupMetadata> {
        let mut meta = BackupMetadata::new(backup_type, actor_id);
        self.repository.create(&meta).await?;

        let dest = self.backup_dir.join(&meta.path);
        let sources = self.sources_for(backup_type);
        let backup_dir = self.backup_dir.clone();

        // Once the pending row exists, every archiving error lands the row
        // in the failed state rather than escaping as a transport error.
        let archived = tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&backup_dir).with_context(|| {
                format!("Failed to create backup dir {}", backup_dir.display())
            })?;
            build_archive(&dest, &sources)
        })
        .await
        .context("Archive task panicked")
        .and_then(|r| r);

        match archived {
            Ok(size) => {
                self.repository
                    .set_status(&meta.id, BackupStatus::Completed, size)
                    .await?;
                meta.status = BackupStatus::Completed;
                meta.size = size;
                tracing::info!(id = %meta.id, size, "Backup completed: {}", meta.path);
            }
            Err(e) => {
                tracing::error!(id = %meta.id, "Backup failed: {:?}", e);
                self.repository
                    .set_status(&meta.id, BackupStatus::Failed, 0)
                    .await?;
                meta.status = BackupStatus::Failed;
            }
        }

        self.audit
            .record(AuditLogEntry::new(
                "backup.create",
                actor_id,
                "backup",
                Some(meta.id.clone()),
                json!({ "type": backup_type.as_str(), "status": meta.status.as_str() }),
                ip_address,
            ))
            .await?;

        Ok(meta)
    }

    pub async fn list(&self) -> Result<Vec<BackupMetadata>> {
        self.repository.list().await
    }

    pub async fn get(&self, id: &str) -> Result<BackupMetadata> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| CmsError::not_found("Backup not found").into())
    }

    /// Delete the metadata row and the archive file, if it is still there.
    pub async fn delete(&self, id: &str, actor_id: &str, ip_address: &str) -> Result<()> {
        let meta = self.get(id).await?;
        self.repository.delete(id).await?;

        let archive = self.backup_dir.join(&meta.path);
        if archive.exists() {
            std::fs::remove_file(&archive)
                .with_context(|| format!("Failed to remove archive {}", archive.display()))?;
        }

        self.audit
            .record(AuditLogEntry::new(
                "backup.delete",
                actor_id,
                "backup",
                Some(meta.id),
                json!({ "path": meta.path }),
                ip_address,
            ))
            .await?;
        Ok(())
    }

    /// Acknowledge a restore request. Extraction is not performed here;
    /// the request is validated against the registry and audited.
    pub async fn restore(
        &self,
        id: &str,
        actor_id: &str,
        ip_address: &str,
    ) -> Result<BackupMetadata> {
        let meta = self.get(id).await?;
        if meta.status != BackupStatus::Completed {
            return Err(CmsError::conflict(format!(
                "Cannot restore a {} backup",
                meta.status.as_str()
            ))
            .into());
        }

        self.audit
            .record(AuditLogEntry::new(
                "backup.restore",
                actor_id,
                "backup",
                Some(meta.id.clone()),
                json!({ "path": meta.path }),
                ip_address,
            ))
            .await?;
        Ok(meta)
    }

    fn sources_for(&self, backup_type: BackupType) -> Vec<(String, PathBuf)> {
        match backup_type {
            BackupType::Full => vec![
                ("content".to_string(), self.content_dir.clone()),
                ("media".to_string(), self.media_dir.clone()),
                ("config".to_string(), self.config_dir.clone()),
            ],
            BackupType::Content => vec![("content".to_string(), self.content_dir.clone())],
            BackupType::Media => vec![("media".to_string(), self.media_dir.clone())],
        }
    }
}

/// Walk each source directory and stream its files into a gzip-compressed
/// tar archive at `dest`. Returns the archive size in bytes. Source
/// directories that do not exist yet are skipped.
fn build_archive(dest: &Path, sources: &[(String, PathBuf)]) -> Result<i64> {
    let file = File::create(dest)
        .with_context(|| format!("Failed to create archive {}", dest.display()))?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (prefix, dir) in sources {
        if !dir.is_dir() {
            continue;
        }
        for entry in WalkDir::new(dir) {
            let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(dir)
                .context("Walked file outside its source dir")?;
            let name = Path::new(prefix).join(relative);
            builder
                .append_path_with_name(entry.path(), &name)
                .with_context(|| format!("Failed to archive {}", entry.path().display()))?;
        }
    }

    let encoder = builder.into_inner().context("Failed to finish tar")?;
    let file = encoder.finish().context("Failed to finish gzip stream")?;
    let size = file.metadata().context("Failed to stat archive")?.len() as i64;
    Ok(size)
}
