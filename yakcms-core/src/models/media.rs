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

/// Derived-size files produced alongside an uploaded image.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MediaVariants {
    pub thumbnail: Option<String>,
    pub small: Option<String>,
    pub medium: Option<String>,
    pub large: Option<String>,
}

impl MediaVariants {
    pub fn is_empty(&self) -> bool {
        self.thumbnail.is_none()
            && self.small.is_none()
            && self.medium.is_none()
            && self.large.is_none()
    }

    /// All variant paths that actually exist, for deletion.
    pub fn paths(&self) -> Vec<&str> {
        [&self.thumbnail, &self.small, &self.medium, &self.large]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaItem {
    pub id: Option<i64>,
    pub filename: String,
    pub path: String,
    pub mime_type: String,
    pub size: i64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub format: Option<String>,
    pub variants: MediaVariants,
    pub uploaded_by: String,
    pub created_at: DateTime<Utc>,
}

impl MediaItem {
    pub fn new(
        filename: String,
        path: String,
        mime_type: String,
        size: i64,
        uploaded_by: String,
    ) -> Self {
        Self {
            id: None,
            filename,
            path,
            mime_type,
            size,
            width: None,
            height: None,
            format: None,
            variants: MediaVariants::default(),
            uploaded_by,
            created_at: Utc::now(),
        }
    }

    /// Every stored file belonging to this item (original plus variants).
    pub fn all_paths(&self) -> Vec<&str> {
        let mut paths = vec![self.path.as_str()];
        paths.extend(self.variants.paths());
        paths
    }
}
