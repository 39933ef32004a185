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

pub mod error;
pub mod models;
pub mod schedule;
pub mod utils;

pub use error::CmsError;
pub use models::audit::AuditLogEntry;
pub use models::author::{Author, AuthorRole};
pub use models::backup::{BackupMetadata, BackupStatus, BackupType};
pub use models::media::MediaItem;
pub use models::post::{Post, PostStatus};
pub use models::token::{AuthToken, TokenPurpose};
