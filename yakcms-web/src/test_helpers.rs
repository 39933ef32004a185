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

#[cfg(test)]
use crate::{config::Config, state::AppState};
#[cfg(test)]
use sqlx::SqlitePool;

/// In-memory database plus throwaway data directories. The returned
/// `TempDir` must be kept alive for the duration of the test.
#[cfg(test)]
pub async fn create_test_app_state() -> Result<(AppState, tempfile::TempDir), anyhow::Error> {
    let pool = SqlitePool::connect(":memory:").await?;
    yakcms_db::create_schema(&pool).await?;

    let dir = tempfile::tempdir()?;
    let root = dir.path();
    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        content_dir: root.join("content").to_string_lossy().to_string(),
        media_dir: root.join("media").to_string_lossy().to_string(),
        config_dir: root.join("config").to_string_lossy().to_string(),
        backup_dir: root.join("backups").to_string_lossy().to_string(),
        max_upload_size: 1024 * 1024,
        audit_flush_threshold: 100,
        audit_flush_interval_secs: 60,
        api_rate_limit: 10_000,
        auth_rate_limit: 10_000,
    };

    Ok((AppState::new(pool, config), dir))
}
