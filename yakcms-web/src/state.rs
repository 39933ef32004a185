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

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::config::Config;
use crate::rate_limit::{create_rate_limiter, SharedRateLimiter};
use crate::services::{AuditLogger, BackupCoordinator};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    pub audit: Arc<AuditLogger>,
    pub backups: Arc<BackupCoordinator>,
    pub api_rate_limiter: SharedRateLimiter,
    pub auth_rate_limiter: SharedRateLimiter,
}

impl AppState {
    pub fn new(db: SqlitePool, config: Config) -> Self {
        let audit = Arc::new(AuditLogger::new(db.clone(), config.audit_flush_threshold));
        let backups = Arc::new(BackupCoordinator::new(db.clone(), audit.clone(), &config));
        let api_rate_limiter = create_rate_limiter(config.api_rate_limit);
        let auth_rate_limiter = create_rate_limiter(config.auth_rate_limit);
        Self {
            db,
            config,
            audit,
            backups,
            api_rate_limiter,
            auth_rate_limiter,
        }
    }
}
