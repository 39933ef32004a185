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

pub mod audit_repository;
pub mod author_repository;
pub mod backup_repository;
pub mod media_repository;
pub mod post_repository;
pub mod token_repository;

pub use audit_repository::*;
pub use author_repository::*;
pub use backup_repository::*;
pub use media_repository::*;
pub use post_repository::*;
pub use token_repository::*;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

/// SQLite stores datetimes either as RFC 3339 or as "YYYY-MM-DD HH:MM:SS".
pub(crate) fn parse_datetime(s: &str, column: &str) -> Result<DateTime<Utc>> {
    if s.contains('T') {
        Ok(DateTime::parse_from_rfc3339(s)
            .with_context(|| format!("Failed to parse {} as RFC3339", column))?
            .with_timezone(&Utc))
    } else {
        Ok(
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .with_context(|| format!("Failed to parse {} as SQLite format", column))?
                .and_utc(),
        )
    }
}

/// Datetimes are bound as RFC 3339 text at fixed microsecond precision so
/// lexicographic ordering in SQL matches chronological ordering.
pub(crate) fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}
