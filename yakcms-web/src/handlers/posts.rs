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

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use yakcms_core::error::CmsError;
use yakcms_core::models::audit::AuditLogEntry;
use yakcms_core::models::post::{Post, PostStatus, SeoMeta};
use yakcms_core::schedule::{self, PublishMode, Resolution};
use yakcms_core::utils::slug::generate_slug_from_title;
use yakcms_db::repositories::{PostFilter, PostRepository};

use crate::content;
use crate::error::AppError;
use crate::handlers::RequestMeta;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Serialize)]
pub struct PostListResponse {
    pub posts: Vec<Post>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
    pub limit: i64,
}

/// Editable post fields plus the scheduling triple. The same shape serves
/// create and update; update additionally requires `expected_version`.
#[derive(Debug, Deserialize)]
pub struct PostInput {
    pub title: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub body: String,
    pub author: String,
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    pub cover_image: Option<String>,
    pub seo: Option<SeoMeta>,
    pub publish_mode: Option<PublishMode>,
    pub publish_date: Option<String>,
    pub publish_time: Option<String>,
    pub timezone: Option<String>,
    pub expected_version: Option<i64>,
}

#[derive(Serialize)]
pub struct PostResponse {
    #[serde(flatten)]
    pub post: Post,
    /// Set when a scheduled wall-clock time fell in a DST fall-back window
    /// and the earlier offset was chosen.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub schedule_ambiguous: bool,
}

fn resolve_schedule(input: &PostInput) -> Result<Resolution, AppError> {
    let mode = input.publish_mode.unwrap_or(PublishMode::Draft);
    let date = input
        .publish_date
        .as_deref()
        .map(schedule::parse_date)
        .transpose()?;
    let time = input
        .publish_time
        .as_deref()
        .map(schedule::parse_time)
        .transpose()?;
    let tz = input
        .timezone
        .as_deref()
        .map(schedule::parse_timezone)
        .transpose()?;
    Ok(schedule::resolve(mode, date, time, tz, Utc::now())?)
}

fn apply_fields(post: &mut Post, input: &PostInput) {
    post.title = input.title.clone();
    post.description = input.description.clone();
    post.body = input.body.clone();
    post.author = input.author.clone();
    post.category = input.category.clone();
    post.tags = input.tags.clone();
    post.featured = input.featured;
    post.cover_image = input.cover_image.clone();
    post.seo = input.seo.clone();
}

pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<PostListResponse>, AppError> {
    let status = query
        .status
        .as_deref()
        .map(PostStatus::parse)
        .transpose()
        .map_err(CmsError::validation)?;

    let filter = PostFilter {
        status,
        search: query.search,
        page: query.page.unwrap_or(1),
        limit: query.limit.unwrap_or(10),
    };

    let page = PostRepository::new(state.db.clone()).list(filter).await?;
    Ok(Json(PostListResponse {
        posts: page.posts,
        total: page.total,
        page: page.page,
        total_pages: page.total_pages,
        limit: page.limit,
    }))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Post>, AppError> {
    let post = PostRepository::new(state.db.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| CmsError::not_found("Post not found"))?;
    Ok(Json(post))
}

pub async fn create_post(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(input): Json<PostInput>,
) -> Result<(StatusCode, Json<PostResponse>), AppError> {
    let resolution = resolve_schedule(&input)?;

    let slug = match &input.slug {
        Some(slug) => slug.clone(),
        None => generate_slug_from_title(&input.title),
    };
    let mut post = Post::new(
        slug,
        input.title.clone(),
        input.body.clone(),
        input.author.clone(),
    );
    apply_fields(&mut post, &input);
    post.status = resolution.status;
    post.published_at = resolution.published_at;
    post.is_valid().map_err(CmsError::validation)?;

    let id = PostRepository::new(state.db.clone()).create(&post).await?;
    post.id = Some(id);

    content::write_post_file(&state.config.content_dir, &post)?;

    state
        .audit
        .record(AuditLogEntry::new(
            "post.create",
            &meta.actor_id,
            "post",
            Some(id.to_string()),
            json!({ "slug": post.slug, "status": post.status.as_str() }),
            &meta.ip_address,
        ))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PostResponse {
            post,
            schedule_ambiguous: resolution.ambiguous,
        }),
    ))
}

pub async fn update_post(
    State(state): State<AppState>,
    meta: RequestMeta,
    Path(id): Path<i64>,
    Json(input): Json<PostInput>,
) -> Result<Json<PostResponse>, AppError> {
    let expected_version = input
        .expected_version
        .ok_or_else(|| CmsError::validation("expected_version is required"))?;

    let repository = PostRepository::new(state.db.clone());
    let existing = repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| CmsError::not_found("Post not found"))?;

    // Publication state only changes when the caller sends a mode;
    // otherwise the stored status and instant survive the edit.
    let resolution = match input.publish_mode {
        Some(_) => Some(resolve_schedule(&input)?),
        None => None,
    };
    let mut post = existing.clone();
    if let Some(slug) = &input.slug {
        post.slug = slug.clone();
    }
    apply_fields(&mut post, &input);
    if let Some(resolution) = &resolution {
        post.status = resolution.status;
        post.published_at = resolution.published_at;
    }

    let updated = repository.update(id, &post, expected_version).await?;
    content::rename_post_file(&state.config.content_dir, &existing.slug, &updated)?;

    state
        .audit
        .record(AuditLogEntry::new(
            "post.update",
            &meta.actor_id,
            "post",
            Some(id.to_string()),
            json!({
                "slug": updated.slug,
                "status": updated.status.as_str(),
                "version": updated.version,
            }),
            &meta.ip_address,
        ))
        .await?;

    Ok(Json(PostResponse {
        post: updated,
        schedule_ambiguous: resolution.map(|r| r.ambiguous).unwrap_or(false),
    }))
}

pub async fn delete_post(
    State(state): State<AppState>,
    meta: RequestMeta,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let repository = PostRepository::new(state.db.clone());
    let post = repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| CmsError::not_found("Post not found"))?;

    repository.delete(id).await?;
    content::remove_post_file(&state.config.content_dir, &post.slug)?;

    state
        .audit
        .record(AuditLogEntry::new(
            "post.delete",
            &meta.actor_id,
            "post",
            Some(id.to_string()),
            json!({ "slug": post.slug }),
            &meta.ip_address,
        ))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
