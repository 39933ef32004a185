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

use crate::utils::slug::generate_slug_from_title;

/// Publication state of a post.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
    Scheduled,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Scheduled => "scheduled",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            "scheduled" => Ok(PostStatus::Scheduled),
            other => Err(format!("Invalid post status: {}", other)),
        }
    }
}

/// Optional SEO overrides carried alongside a post.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SeoMeta {
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: Option<i64>,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub body: String,
    pub status: PostStatus,
    /// Absolute UTC instant at which the post is (or becomes) visible.
    /// Always `None` for drafts.
    pub published_at: Option<DateTime<Utc>>,
    pub author: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub featured: bool,
    pub cover_image: Option<String>,
    pub seo: Option<SeoMeta>,
    /// Optimistic concurrency counter, starts at 1 and increments on update.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(slug: String, title: String, body: String, author: String) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            slug,
            title,
            description: None,
            body,
            status: PostStatus::Draft,
            published_at: None,
            author,
            category: None,
            tags: Vec::new(),
            featured: false,
            cover_image: None,
            seo: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a new draft with the slug derived from the title.
    pub fn new_with_title(title: String, body: String, author: String) -> Self {
        let slug = generate_slug_from_title(&title);
        Self::new(slug, title, body, author)
    }

    pub fn validate_title(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Title is required".to_string());
        }
        if self.title.len() > 255 {
            return Err("Title cannot exceed 255 characters".to_string());
        }
        Ok(())
    }

    pub fn validate_slug(&self) -> Result<(), String> {
        if self.slug.is_empty() {
            return Err("Slug cannot be empty".to_string());
        }
        if self.slug.len() > 100 {
            return Err("Slug cannot exceed 100 characters".to_string());
        }
        let valid = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-';
        if !self.slug.chars().all(valid) {
            return Err(
                "Slug can only contain lowercase letters, numbers, and hyphens".to_string(),
            );
        }
        if self.slug.starts_with('-') || self.slug.ends_with('-') {
            return Err("Slug cannot start or end with a hyphen".to_string());
        }
        Ok(())
    }

    pub fn validate_author(&self) -> Result<(), String> {
        if self.author.trim().is_empty() {
            return Err("Author is required".to_string());
        }
        Ok(())
    }

    /// A publish instant is carried exactly when the post is not a draft.
    pub fn validate_status(&self) -> Result<(), String> {
        match (self.status, self.published_at) {
            (PostStatus::Draft, Some(_)) => {
                Err("Draft posts cannot carry a publish instant".to_string())
            }
            (PostStatus::Published, None) | (PostStatus::Scheduled, None) => {
                Err("Published and scheduled posts require a publish instant".to_string())
            }
            _ => Ok(()),
        }
    }

    pub fn is_valid(&self) -> Result<(), String> {
        self.validate_title()?;
        self.validate_slug()?;
        self.validate_author()?;
        self.validate_status()?;
        Ok(())
    }

    /// Visible to readers: published, or scheduled with an elapsed instant.
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            PostStatus::Draft => false,
            PostStatus::Published => true,
            PostStatus::Scheduled => self.published_at.map(|at| at <= now).unwrap_or(false),
        }
    }
}
