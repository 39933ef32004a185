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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackupType {
    Full,
    Content,
    Media,
}

impl BackupType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupType::Full => "full",
            BackupType::Content => "content",
            BackupType::Media => "media",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "full" => Ok(BackupType::Full),
            "content" => Ok(BackupType::Content),
            "media" => Ok(BackupType::Media),
            other => Err(format!("Invalid backup type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackupStatus {
    Pending,
    Completed,
    Failed,
}

impl BackupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupStatus::Pending => "pending",
            BackupStatus::Completed => "completed",
            BackupStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "pending" => Ok(BackupStatus::Pending),
            "completed" => Ok(BackupStatus::Completed),
            "failed" => Ok(BackupStatus::Failed),
            other => Err(format!("Invalid backup status: {}", other)),
        }
    }
}

/// Registry record for one archive. Created pending, updated exactly once
/// to completed or failed; the record persists even when the archive fails.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackupMetadata {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub backup_type: BackupType,
    pub size: i64,
    pub created_by: String,
    pub status: BackupStatus,
    pub path: String,
}

impl BackupMetadata {
    pub fn new(backup_type: BackupType, created_by: impl Into<String>) -> Self {
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let path = format!(
            "backup-{}-{}.tar.gz",
            backup_type.as_str(),
            created_at.format("%Y%m%dT%H%M%S")
        );
        Self {
            id,
            created_at,
            backup_type,
            size: 0,
            created_by: created_by.into(),
            status: BackupStatus::Pending,
            path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_pending_with_archive_name() {
        let meta = BackupMetadata::new(BackupType::Content, "jane");
        assert_eq!(meta.status, BackupStatus::Pending);
        assert_eq!(meta.size, 0);
        assert!(meta.path.starts_with("backup-content-"));
        assert!(meta.path.ends_with(".tar.gz"));
    }

    #[test]
    fn test_type_and_status_round_trip() {
        for t in [BackupType::Full, BackupType::Content, BackupType::Media] {
            assert_eq!(BackupType::parse(t.as_str()), Ok(t));
        }
        for s in [BackupStatus::Pending, BackupStatus::Completed, BackupStatus::Failed] {
            assert_eq!(BackupStatus::parse(s.as_str()), Ok(s));
        }
        assert!(BackupType::parse("incremental").is_err());
    }
}
