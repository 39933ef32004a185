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
use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use yakcms_core::models::post::{Post, PostStatus, SeoMeta};
use yakcms_core::CmsError;

use super::{format_datetime, parse_datetime};

/// Filters for [`PostRepository::list`].
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub status: Option<PostStatus>,
    /// Free-text search across title and body.
    pub search: Option<String>,
    /// 1-based page index.
    pub page: i64,
    pub limit: i64,
}

impl PostFilter {
    pub fn normalized(mut self) -> Self {
        if self.page < 1 {
            self.page = 1;
        }
        if self.limit < 1 {
            self.limit = 10;
        }
        self
    }
}

/// One page of posts plus pagination bookkeeping.
#[derive(Debug, Clone)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
    pub limit: i64,
}

pub struct PostRepository {
    pool: SqlitePool,
}

type PostRow = (
    i64,            // id
    String,         // slug
    String,         // title
    Option<String>, // description
    String,         // body
    String,         // status
    Option<String>, // published_at
    String,         // author
    Option<String>, // category
    String,         // tags (JSON)
    bool,           // featured
    Option<String>, // cover_image
    Option<String>, // seo (JSON)
    i64,            // version
    String,         // created_at
    String,         // updated_at
);

const POST_COLUMNS: &str = "id, slug, title, description, body, status, published_at, author, \
     category, tags, featured, cover_image, seo, version, created_at, updated_at";

impl PostRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new post at version 1. The slug must be unique.
    pub async fn create(&self, post: &Post) -> Result<i64> {
        post.is_valid().map_err(CmsError::validation)?;

        let existing = sqlx::query("SELECT id FROM posts WHERE slug = ?")
            .bind(&post.slug)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to check slug uniqueness")?;
        if existing.is_some() {
            return Err(CmsError::conflict(format!(
                "A post with slug '{}' already exists",
                post.slug
            ))
            .into());
        }

        let result = sqlx::query(
            r#"
            INSERT INTO posts (slug, title, description, body, status, published_at, author,
                               category, tags, featured, cover_image, seo, version, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(&post.slug)
        .bind(&post.title)
        .bind(&post.description)
        .bind(&post.body)
        .bind(post.status.as_str())
        .bind(post.published_at.map(format_datetime))
        .bind(&post.author)
        .bind(&post.category)
        .bind(serde_json::to_string(&post.tags)?)
        .bind(post.featured)
        .bind(&post.cover_image)
        .bind(post.seo.as_ref().map(serde_json::to_string).transpose()?)
        .bind(format_datetime(post.created_at))
        .bind(format_datetime(post.updated_at))
        .execute(&self.pool)
        .await
        .context("Failed to create post")?;

        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {} FROM posts WHERE id = ?",
            POST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find post by id")?;

        row.map(from_row).transpose()
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {} FROM posts WHERE slug = ?",
            POST_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find post by slug")?;

        row.map(from_row).transpose()
    }

    /// Apply `post`'s fields to the stored row, guarded by optimistic
    /// concurrency: when the stored version is already past
    /// `expected_version` the update is rejected with a conflict and
    /// nothing changes. On success the version increments by one.
    pub async fn update(&self, id: i64, post: &Post, expected_version: i64) -> Result<Post> {
        post.is_valid().map_err(CmsError::validation)?;

        let taken = sqlx::query("SELECT id FROM posts WHERE slug = ? AND id != ?")
            .bind(&post.slug)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to check slug uniqueness")?;
        if taken.is_some() {
            return Err(CmsError::conflict(format!(
                "A post with slug '{}' already exists",
                post.slug
            ))
            .into());
        }

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET slug = ?, title = ?, description = ?, body = ?, status = ?, published_at = ?,
                author = ?, category = ?, tags = ?, featured = ?, cover_image = ?, seo = ?,
                version = version + 1, updated_at = ?
            WHERE id = ? AND version <= ?
            "#,
        )
        .bind(&post.slug)
        .bind(&post.title)
        .bind(&post.description)
        .bind(&post.body)
        .bind(post.status.as_str())
        .bind(post.published_at.map(format_datetime))
        .bind(&post.author)
        .bind(&post.category)
        .bind(serde_json::to_string(&post.tags)?)
        .bind(post.featured)
        .bind(&post.cover_image)
        .bind(post.seo.as_ref().map(serde_json::to_string).transpose()?)
        .bind(format_datetime(now))
        .bind(id)
        .bind(expected_version)
        .execute(&self.pool)
        .await
        .context("Failed to update post")?;

        if result.rows_affected() == 0 {
            // Either the post is gone or someone committed first.
            return match self.find_by_id(id).await? {
                Some(current) => Err(CmsError::conflict(format!(
                    "Post was modified by someone else (stored version {}, expected {})",
                    current.version, expected_version
                ))
                .into()),
                None => Err(CmsError::not_found("Post not found").into()),
            };
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| CmsError::not_found("Post not found").into())
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete post")?;

        if result.rows_affected() == 0 {
            return Err(CmsError::not_found("Post not found").into());
        }
        Ok(())
    }

    pub async fn list(&self, filter: PostFilter) -> Result<PostPage> {
        let filter = filter.normalized();

        let mut count_qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM posts WHERE 1=1");
        let mut list_qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM posts WHERE 1=1", POST_COLUMNS));

        for qb in [&mut count_qb, &mut list_qb] {
            if let Some(status) = filter.status {
                qb.push(" AND status = ").push_bind(status.as_str());
            }
            if let Some(search) = &filter.search {
                let pattern = format!("%{}%", search);
                qb.push(" AND (title LIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR body LIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
        }

        let total: i64 = count_qb
            .build()
            .fetch_one(&self.pool)
            .await
            .context("Failed to count posts")?
            .get(0);

        list_qb
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind((filter.page - 1) * filter.limit);

        let rows = list_qb
            .build_query_as::<PostRow>()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list posts")?;

        let posts = rows.into_iter().map(from_row).collect::<Result<Vec<_>>>()?;
        let total_pages = if total == 0 {
            0
        } else {
            (total + filter.limit - 1) / filter.limit
        };

        Ok(PostPage {
            posts,
            total,
            page: filter.page,
            total_pages,
            limit: filter.limit,
        })
    }

    /// Does any post reference the given media path, either inline in the
    /// body or as its cover image?
    pub async fn references_media(&self, media_path: &str) -> Result<bool> {
        let row = sqlx::query("SELECT id FROM posts WHERE body LIKE ? OR cover_image = ? LIMIT 1")
            .bind(format!("%{}%", media_path))
            .bind(media_path)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to check media references")?;
        Ok(row.is_some())
    }
}

fn from_row(row: PostRow) -> Result<Post> {
    let (
        id,
        slug,
        title,
        description,
        body,
        status,
        published_at,
        author,
        category,
        tags,
        featured,
        cover_image,
        seo,
        version,
        created_at,
        updated_at,
    ) = row;

    let status = PostStatus::parse(&status).map_err(anyhow::Error::msg)?;
    let published_at = published_at
        .map(|s| parse_datetime(&s, "published_at"))
        .transpose()?;
    let tags: Vec<String> = serde_json::from_str(&tags).context("Failed to parse tags")?;
    let seo: Option<SeoMeta> = seo
        .map(|s| serde_json::from_str(&s))
        .transpose()
        .context("Failed to parse seo")?;

    Ok(Post {
        id: Some(id),
        slug,
        title,
        description,
        body,
        status,
        published_at,
        author,
        category,
        tags,
        featured,
        cover_image,
        seo,
        version,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init::create_schema;
    use pretty_assertions::assert_eq;

    async fn setup() -> Result<PostRepository> {
        let pool = SqlitePool::connect(":memory:").await?;
        create_schema(&pool).await?;
        Ok(PostRepository::new(pool))
    }

    fn draft(title: &str) -> Post {
        Post::new_with_title(title.to_string(), "body".to_string(), "jane".to_string())
    }

    #[sqlx::test]
    async fn test_create_and_find() -> Result<()> {
        let repo = setup().await?;
        let id = repo.create(&draft("Hello World")).await?;

        let found = repo.find_by_id(id).await?.expect("post should exist");
        assert_eq!(found.slug, "hello-world");
        assert_eq!(found.version, 1);
        assert_eq!(found.status, PostStatus::Draft);

        let by_slug = repo.find_by_slug("hello-world").await?;
        assert_eq!(by_slug.map(|p| p.id), Some(Some(id)));
        Ok(())
    }

    #[sqlx::test]
    async fn test_create_duplicate_slug_conflicts() -> Result<()> {
        let repo = setup().await?;
        repo.create(&draft("Hello World")).await?;

        let err = repo.create(&draft("Hello World")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CmsError>(),
            Some(CmsError::Conflict(_))
        ));
        Ok(())
    }

    #[sqlx::test]
    async fn test_update_increments_version() -> Result<()> {
        let repo = setup().await?;
        let id = repo.create(&draft("Hello World")).await?;

        let mut post = repo.find_by_id(id).await?.unwrap();
        post.title = "Hello Again".to_string();
        let updated = repo.update(id, &post, 1).await?;
        assert_eq!(updated.version, 2);
        assert_eq!(updated.title, "Hello Again");
        assert!(updated.updated_at >= updated.created_at);
        Ok(())
    }

    #[sqlx::test]
    async fn test_stale_update_conflicts() -> Result<()> {
        let repo = setup().await?;
        let id = repo.create(&draft("Hello World")).await?;

        let mut first = repo.find_by_id(id).await?.unwrap();
        first.title = "First".to_string();
        repo.update(id, &first, 1).await?;

        // Second writer still believes the post is at version 1.
        let mut second = first.clone();
        second.title = "Second".to_string();
        let err = repo.update(id, &second, 1).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CmsError>(),
            Some(CmsError::Conflict(_))
        ));

        let stored = repo.find_by_id(id).await?.unwrap();
        assert_eq!(stored.title, "First");
        assert_eq!(stored.version, 2);
        Ok(())
    }

    #[sqlx::test]
    async fn test_update_to_taken_slug_conflicts() -> Result<()> {
        let repo = setup().await?;
        repo.create(&draft("First Post")).await?;
        let id = repo.create(&draft("Second Post")).await?;

        let mut post = repo.find_by_id(id).await?.unwrap();
        post.slug = "first-post".to_string();
        let err = repo.update(id, &post, 1).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CmsError>(),
            Some(CmsError::Conflict(_))
        ));

        // Keeping its own slug is not a collision.
        let mut same = repo.find_by_id(id).await?.unwrap();
        same.title = "Second Post, Revised".to_string();
        let updated = repo.update(id, &same, 1).await?;
        assert_eq!(updated.slug, "second-post");
        Ok(())
    }

    #[sqlx::test]
    async fn test_update_missing_post_is_not_found() -> Result<()> {
        let repo = setup().await?;
        let post = draft("Ghost");
        let err = repo.update(999, &post, 1).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CmsError>(),
            Some(CmsError::NotFound(_))
        ));
        Ok(())
    }

    #[sqlx::test]
    async fn test_delete() -> Result<()> {
        let repo = setup().await?;
        let id = repo.create(&draft("Hello World")).await?;
        repo.delete(id).await?;
        assert!(repo.find_by_id(id).await?.is_none());

        let err = repo.delete(id).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CmsError>(),
            Some(CmsError::NotFound(_))
        ));
        Ok(())
    }

    #[sqlx::test]
    async fn test_list_filters_and_paginates() -> Result<()> {
        let repo = setup().await?;
        for i in 0..5 {
            let mut post = draft(&format!("Post {}", i));
            if i % 2 == 0 {
                post.status = PostStatus::Published;
                post.published_at = Some(Utc::now());
            }
            repo.create(&post).await?;
        }

        let all = repo
            .list(PostFilter {
                page: 1,
                limit: 2,
                ..Default::default()
            })
            .await?;
        assert_eq!(all.total, 5);
        assert_eq!(all.total_pages, 3);
        assert_eq!(all.posts.len(), 2);

        let published = repo
            .list(PostFilter {
                status: Some(PostStatus::Published),
                page: 1,
                limit: 10,
                ..Default::default()
            })
            .await?;
        assert_eq!(published.total, 3);

        let searched = repo
            .list(PostFilter {
                search: Some("Post 3".to_string()),
                page: 1,
                limit: 10,
                ..Default::default()
            })
            .await?;
        assert_eq!(searched.total, 1);
        assert_eq!(searched.posts[0].title, "Post 3");
        Ok(())
    }

    #[sqlx::test]
    async fn test_references_media() -> Result<()> {
        let repo = setup().await?;
        let mut post = draft("With Image");
        post.body = "![hero](media/hero.png)".to_string();
        repo.create(&post).await?;

        let mut cover = draft("With Cover");
        cover.cover_image = Some("media/cover.png".to_string());
        repo.create(&cover).await?;

        assert!(repo.references_media("media/hero.png").await?);
        assert!(repo.references_media("media/cover.png").await?);
        assert!(!repo.references_media("media/unused.png").await?);
        Ok(())
    }
}
