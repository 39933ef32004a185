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
use std::{env, path::PathBuf};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub content_dir: String,
    pub media_dir: String,
    pub config_dir: String,
    pub backup_dir: String,
    pub max_upload_size: usize,
    pub audit_flush_threshold: usize,
    pub audit_flush_interval_secs: u64,
    pub api_rate_limit: u32,
    pub auth_rate_limit: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let data_root = Self::default_data_root();

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:yakcms.db".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("Invalid PORT")?,
            content_dir: env::var("CONTENT_DIR")
                .unwrap_or_else(|_| path_under(&data_root, "content")),
            media_dir: env::var("MEDIA_DIR").unwrap_or_else(|_| path_under(&data_root, "media")),
            config_dir: env::var("CONFIG_DIR").unwrap_or_else(|_| path_under(&data_root, "config")),
            backup_dir: env::var("BACKUP_DIR")
                .unwrap_or_else(|_| path_under(&data_root, "backups")),
            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .unwrap_or_else(|_| "10485760".to_string()) // 10MB default
                .parse()
                .unwrap_or(10_485_760),
            audit_flush_threshold: env::var("AUDIT_FLUSH_THRESHOLD")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .unwrap_or(100),
            audit_flush_interval_secs: env::var("AUDIT_FLUSH_INTERVAL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
            api_rate_limit: env::var("API_RATE_LIMIT")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .unwrap_or(120),
            auth_rate_limit: env::var("AUTH_RATE_LIMIT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
        })
    }

    fn default_data_root() -> PathBuf {
        env::var("HOME")
            .map(|home| PathBuf::from(home).join(".yakcms"))
            .unwrap_or_else(|_| PathBuf::from("/var/yakcms"))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn path_under(root: &PathBuf, name: &str) -> String {
    root.join(name).to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_addr() {
        let config = Config {
            database_url: "sqlite::memory:".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8080,
            content_dir: "/tmp/content".to_string(),
            media_dir: "/tmp/media".to_string(),
            config_dir: "/tmp/config".to_string(),
            backup_dir: "/tmp/backups".to_string(),
            max_upload_size: 1024,
            audit_flush_threshold: 100,
            audit_flush_interval_secs: 60,
            api_rate_limit: 120,
            auth_rate_limit: 10,
        };
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }
}
