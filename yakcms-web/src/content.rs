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

//! Mirrors posts to markdown files with frontmatter under the content
//! directory. The database is the source of truth; these files exist so
//! content backups carry a portable copy of every post.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use yakcms_core::models::post::Post;
use yakcms_core::utils::frontmatter;

pub fn post_file_path(content_dir: &str, slug: &str) -> PathBuf {
    Path::new(content_dir).join(format!("{}.md", slug))
}

/// Write (or overwrite) the markdown mirror for a post.
pub fn write_post_file(content_dir: &str, post: &Post) -> Result<()> {
    std::fs::create_dir_all(content_dir)
        .with_context(|| format!("Failed to create content dir {}", content_dir))?;
    let path = post_file_path(content_dir, &post.slug);
    std::fs::write(&path, frontmatter::serialize_post(post))
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Remove the markdown mirror, tolerating a file that was never written.
pub fn remove_post_file(content_dir: &str, slug: &str) -> Result<()> {
    let path = post_file_path(content_dir, slug);
    match std::fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}

/// Rename the mirror when a post's slug changes, falling back to a fresh
/// write when the old file is missing.
pub fn rename_post_file(content_dir: &str, old_slug: &str, post: &Post) -> Result<()> {
    if old_slug != post.slug {
        remove_post_file(content_dir, old_slug)?;
    }
    write_post_file(content_dir, post)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_post() -> Post {
        Post::new_with_title(
            "Hello World".to_string(),
            "# Hello\n\nFirst post.".to_string(),
            "jane".to_string(),
        )
    }

    #[test]
    fn test_write_and_remove_round_trip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let content_dir = dir.path().to_string_lossy().to_string();
        let post = sample_post();

        write_post_file(&content_dir, &post)?;
        let path = post_file_path(&content_dir, "hello-world");
        let written = std::fs::read_to_string(&path)?;
        assert!(written.starts_with("---\n"));
        assert!(written.contains("title: \"Hello World\""));

        remove_post_file(&content_dir, "hello-world")?;
        assert!(!path.exists());

        // Removing again is fine
        remove_post_file(&content_dir, "hello-world")?;
        Ok(())
    }

    #[test]
    fn test_rename_moves_mirror() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let content_dir = dir.path().to_string_lossy().to_string();
        let mut post = sample_post();
        write_post_file(&content_dir, &post)?;

        post.slug = "hello-again".to_string();
        post.title = "Hello Again".to_string();
        rename_post_file(&content_dir, "hello-world", &post)?;

        assert!(!post_file_path(&content_dir, "hello-world").exists());
        let written = std::fs::read_to_string(post_file_path(&content_dir, "hello-again"))?;
        assert!(written.contains("title: \"Hello Again\""));
        assert!(written.matches("---\n").count() >= 2);
        Ok(())
    }
}
