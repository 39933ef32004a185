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
use sqlx::SqlitePool;
use yakcms_core::models::media::{MediaItem, MediaVariants};
use yakcms_core::CmsError;

use super::{format_datetime, parse_datetime};

pub struct MediaRepository {
    pool: SqlitePool,
}

type MediaRow = (
    i64,            // id
    String,         // filename
    String,         // path
    String,         // mime_type
    i64,            // size
    Option<i64>,    // width
    Option<i64>,    // height
    Option<String>, // format
    String,         // variants (JSON)
    String,         // uploaded_by
    String,         // created_at
);

const MEDIA_COLUMNS: &str =
    "id, filename, path, mime_type, size, width, height, format, variants, uploaded_by, created_at";

impl MediaRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, item: &MediaItem) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO media (filename, path, mime_type, size, width, height, format,
                               variants, uploaded_by, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&item.filename)
        .bind(&item.path)
        .bind(&item.mime_type)
        .bind(item.size)
        .bind(item.width.map(|w| w as i64))
        .bind(item.height.map(|h| h as i64))
        .bind(&item.format)
        .bind(serde_json::to_string(&item.variants)?)
        .bind(&item.uploaded_by)
        .bind(format_datetime(item.created_at))
        .execute(&self.pool)
        .await
        .context("Failed to create media item")?;

        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<MediaItem>> {
        let row = sqlx::query_as::<_, MediaRow>(&format!(
            "SELECT {} FROM media WHERE id = ?",
            MEDIA_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find media by id")?;

        row.map(from_row).transpose()
    }

    /// List all media, optionally narrowed to a MIME type prefix
    /// such as "image/".
    pub async fn list(&self, mime_prefix: Option<&str>) -> Result<Vec<MediaItem>> {
        let rows = match mime_prefix {
            Some(prefix) => {
                sqlx::query_as::<_, MediaRow>(&format!(
                    "SELECT {} FROM media WHERE mime_type LIKE ? ORDER BY created_at DESC",
                    MEDIA_COLUMNS
                ))
                .bind(format!("{}%", prefix))
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, MediaRow>(&format!(
                    "SELECT {} FROM media ORDER BY created_at DESC",
                    MEDIA_COLUMNS
                ))
                .fetch_all(&self.pool)
                .await
            }
        }
        .context("Failed to list media")?;

        rows.into_iter().map(from_row).collect()
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM media WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete media")?;

        if result.rows_affected() == 0 {
            return Err(CmsError::not_found("Media not found").into());
        }
        Ok(())
    }
}

fn from_row(row: MediaRow) -> Result<MediaItem> {
    let (id, filename, path, mime_type, size, width, height, format, variants, uploaded_by, created_at) =
        row;

    let variants: MediaVariants =
        serde_json::from_str(&variants).context("Failed to parse media variants")?;

    Ok(MediaItem {
        id: Some(id),
        filename,
        path,
        mime_type,
        size,
        width: width.map(|w| w as u32),
        height: height.map(|h| h as u32),
        format,
        variants,
        uploaded_by,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init::create_schema;
    use pretty_assertions::assert_eq;

    async fn setup() -> Result<MediaRepository> {
        let pool = SqlitePool::connect(":memory:").await?;
        create_schema(&pool).await?;
        Ok(MediaRepository::new(pool))
    }

    fn item(filename: &str, mime: &str) -> MediaItem {
        MediaItem::new(
            filename.to_string(),
            format!("media/{}", filename),
            mime.to_string(),
            1024,
            "jane".to_string(),
        )
    }

    #[sqlx::test]
    async fn test_create_and_find() -> Result<()> {
        let repo = setup().await?;
        let mut hero = item("hero.png", "image/png");
        hero.width = Some(800);
        hero.height = Some(600);
        hero.variants.thumbnail = Some("media/hero-thumb.png".to_string());

        let id = repo.create(&hero).await?;
        let found = repo.find_by_id(id).await?.expect("media should exist");
        assert_eq!(found.filename, "hero.png");
        assert_eq!(found.width, Some(800));
        assert_eq!(
            found.variants.thumbnail.as_deref(),
            Some("media/hero-thumb.png")
        );
        Ok(())
    }

    #[sqlx::test]
    async fn test_list_with_mime_prefix() -> Result<()> {
        let repo = setup().await?;
        repo.create(&item("hero.png", "image/png")).await?;
        repo.create(&item("clip.mp4", "video/mp4")).await?;

        let images = repo.list(Some("image/")).await?;
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].filename, "hero.png");

        let all = repo.list(None).await?;
        assert_eq!(all.len(), 2);
        Ok(())
    }

    #[sqlx::test]
    async fn test_delete_missing_is_not_found() -> Result<()> {
        let repo = setup().await?;
        let err = repo.delete(42).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CmsError>(),
            Some(CmsError::NotFound(_))
        ));
        Ok(())
    }
}
