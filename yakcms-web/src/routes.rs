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
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::rate_limit::{api_rate_limit_middleware, auth_rate_limit_middleware};
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route(
            "/reset-password",
            post(handlers::auth::request_password_reset).put(handlers::auth::reset_password),
        )
        .route(
            "/verify-email",
            post(handlers::auth::request_email_verification).put(handlers::auth::verify_email),
        )
        .route("/2fa/setup", post(handlers::auth::totp_setup))
        .route("/2fa/verify", post(handlers::auth::totp_verify))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_rate_limit_middleware,
        ));

    let api_routes = Router::new()
        .route(
            "/posts",
            get(handlers::posts::list_posts).post(handlers::posts::create_post),
        )
        .route(
            "/posts/{id}",
            get(handlers::posts::get_post)
                .put(handlers::posts::update_post)
                .delete(handlers::posts::delete_post),
        )
        .route(
            "/authors",
            get(handlers::authors::list_authors).post(handlers::authors::create_author),
        )
        .route(
            "/authors/{id}",
            get(handlers::authors::get_author)
                .put(handlers::authors::update_author)
                .delete(handlers::authors::delete_author),
        )
        .route("/media", get(handlers::media::list_media))
        .route(
            "/media/{id}",
            get(handlers::media::get_media).delete(handlers::media::delete_media),
        )
        .route("/upload", post(handlers::upload::upload_media))
        .route(
            "/backups",
            get(handlers::backups::list_backups).post(handlers::backups::create_backup),
        )
        .route(
            "/backups/{id}",
            get(handlers::backups::get_backup).delete(handlers::backups::delete_backup),
        )
        .route("/backups/{id}/restore", post(handlers::backups::restore_backup))
        .route(
            "/audit/logs",
            get(handlers::audit::list_entries).post(handlers::audit::create_entry),
        )
        .route("/audit/logs/export", post(handlers::audit::export_entries))
        .route("/audit/logs/{id}", get(handlers::audit::get_entry))
        .nest("/auth", auth_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api_rate_limit_middleware,
        ))
        // Health sits outside the rate limit so probes never get a 429
        .route("/health", get(health));

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(state.config.max_upload_size + 64 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;

    async fn test_server() -> (TestServer, tempfile::TempDir) {
        let (state, dir) = crate::test_helpers::create_test_app_state()
            .await
            .expect("Failed to create test state");
        let app = create_router(state);
        (
            TestServer::new(app).expect("Failed to create test server"),
            dir,
        )
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (server, _dir) = test_server().await;

        let response = server.get("/api/health").await;
        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_create_and_fetch_post() {
        let (server, _dir) = test_server().await;

        let response = server
            .post("/api/posts")
            .json(&json!({
                "title": "Hello World",
                "body": "First post.",
                "author": "jane",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: serde_json::Value = response.json();
        assert_eq!(created["slug"], "hello-world");
        assert_eq!(created["status"], "draft");
        let id = created["id"].as_i64().unwrap();

        let response = server.get(&format!("/api/posts/{}", id)).await;
        response.assert_status(StatusCode::OK);
        let fetched: serde_json::Value = response.json();
        assert_eq!(fetched["title"], "Hello World");
    }

    #[tokio::test]
    async fn test_schedule_in_the_past_is_rejected() {
        let (server, _dir) = test_server().await;

        let response = server
            .post("/api/posts")
            .json(&json!({
                "title": "Old News",
                "body": "Too late.",
                "author": "jane",
                "publish_mode": "schedule",
                "publish_date": "2001-01-01",
                "publish_time": "09:00",
                "timezone": "America/New_York",
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "Please select a future date and time");
    }

    #[tokio::test]
    async fn test_stale_update_conflicts() {
        let (server, _dir) = test_server().await;

        let created: serde_json::Value = server
            .post("/api/posts")
            .json(&json!({
                "title": "Versioned",
                "body": "v1",
                "author": "jane",
            }))
            .await
            .json();
        let id = created["id"].as_i64().unwrap();

        let update = json!({
            "title": "Versioned",
            "body": "v2",
            "author": "jane",
            "expected_version": 1,
        });
        server
            .put(&format!("/api/posts/{}", id))
            .json(&update)
            .await
            .assert_status(StatusCode::OK);

        // Same expected_version again: the stored version has moved on
        let response = server.put(&format!("/api/posts/{}", id)).json(&update).await;
        response.assert_status(StatusCode::CONFLICT);
        let body: serde_json::Value = response.json();
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("modified by someone else"));
    }

    #[tokio::test]
    async fn test_update_to_taken_slug_conflicts() {
        let (server, _dir) = test_server().await;

        server
            .post("/api/posts")
            .json(&json!({
                "title": "First Post",
                "body": "one",
                "author": "jane",
            }))
            .await
            .assert_status(StatusCode::CREATED);
        let created: serde_json::Value = server
            .post("/api/posts")
            .json(&json!({
                "title": "Second Post",
                "body": "two",
                "author": "jane",
            }))
            .await
            .json();
        let id = created["id"].as_i64().unwrap();

        let response = server
            .put(&format!("/api/posts/{}", id))
            .json(&json!({
                "title": "Second Post",
                "body": "two",
                "author": "jane",
                "slug": "first-post",
                "expected_version": 1,
            }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        let body: serde_json::Value = response.json();
        assert!(body["error"].as_str().unwrap().contains("first-post"));
    }

    #[tokio::test]
    async fn test_unknown_post_is_json_404() {
        let (server, _dir) = test_server().await;

        let response = server.get("/api/posts/9999").await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "Post not found");
    }

    #[tokio::test]
    async fn test_duplicate_author_email_conflicts() {
        let (server, _dir) = test_server().await;

        let author = json!({ "name": "Jane", "email": "jane@example.com", "role": "admin" });
        server
            .post("/api/authors")
            .json(&author)
            .await
            .assert_status(StatusCode::CREATED);

        let response = server.post("/api/authors").json(&author).await;
        response.assert_status(StatusCode::CONFLICT);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "Email already in use");
    }

    #[tokio::test]
    async fn test_last_admin_cannot_be_deleted() {
        let (server, _dir) = test_server().await;

        let created: serde_json::Value = server
            .post("/api/authors")
            .json(&json!({ "name": "Jane", "email": "jane@example.com", "role": "admin" }))
            .await
            .json();
        let id = created["id"].as_i64().unwrap();

        let response = server.delete(&format!("/api/authors/{}", id)).await;
        response.assert_status(StatusCode::FORBIDDEN);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "Cannot delete last admin author");
    }

    #[tokio::test]
    async fn test_mutations_land_in_the_audit_log() {
        let (server, _dir) = test_server().await;

        server
            .post("/api/posts")
            .add_header("x-actor-id", "jane")
            .json(&json!({
                "title": "Audited",
                "body": "tracked",
                "author": "jane",
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server.get("/api/audit/logs?action=post.create").await;
        response.assert_status(StatusCode::OK);
        let entries: serde_json::Value = response.json();
        let entries = entries.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["actor_id"], "jane");
        assert_eq!(entries[0]["resource_type"], "post");
    }

    #[tokio::test]
    async fn test_backup_lifecycle_over_http() {
        let (server, _dir) = test_server().await;

        server
            .post("/api/posts")
            .json(&json!({ "title": "Keep Me", "body": "data", "author": "jane" }))
            .await
            .assert_status(StatusCode::CREATED);

        let created: serde_json::Value = server
            .post("/api/backups")
            .json(&json!({ "type": "content" }))
            .await
            .json();
        assert_eq!(created["status"], "completed");
        let id = created["id"].as_str().unwrap().to_string();

        let response = server.post(&format!("/api/backups/{}/restore", id)).await;
        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert_eq!(body["acknowledged"], true);

        server
            .delete(&format!("/api/backups/{}", id))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .get(&format!("/api/backups/{}", id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_referenced_media_cannot_be_deleted() {
        use axum_test::multipart::{MultipartForm, Part};

        let (server, _dir) = test_server().await;

        let img = image::DynamicImage::new_rgb8(8, 8);
        let mut png = std::io::Cursor::new(Vec::new());
        img.write_to(&mut png, image::ImageFormat::Png).unwrap();
        let form = MultipartForm::new().add_part(
            "file",
            Part::bytes(png.into_inner())
                .file_name("hero.png")
                .mime_type("image/png"),
        );

        let uploaded: serde_json::Value = server.post("/api/upload").multipart(form).await.json();
        let media_id = uploaded["id"].as_i64().unwrap();
        let path = uploaded["path"].as_str().unwrap().to_string();

        let created: serde_json::Value = server
            .post("/api/posts")
            .json(&json!({
                "title": "With Cover",
                "body": "text",
                "author": "jane",
                "cover_image": path,
            }))
            .await
            .json();
        let post_id = created["id"].as_i64().unwrap();

        let response = server.delete(&format!("/api/media/{}", media_id)).await;
        response.assert_status(StatusCode::CONFLICT);

        // Drop the reference, then deletion goes through
        server
            .put(&format!("/api/posts/{}", post_id))
            .json(&json!({
                "title": "With Cover",
                "body": "text",
                "author": "jane",
                "expected_version": 1,
            }))
            .await
            .assert_status(StatusCode::OK);
        server
            .delete(&format!("/api/media/{}", media_id))
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let (server, _dir) = test_server().await;

        server
            .post("/api/authors")
            .json(&json!({ "name": "Jane", "email": "jane@example.com", "role": "admin" }))
            .await
            .assert_status(StatusCode::CREATED);

        let issued: serde_json::Value = server
            .post("/api/auth/reset-password")
            .json(&json!({ "email": "jane@example.com" }))
            .await
            .json();
        let token = issued["token"].as_str().unwrap().to_string();

        server
            .put("/api/auth/reset-password")
            .json(&json!({ "token": token.clone(), "password": "s3cure-enough" }))
            .await
            .assert_status(StatusCode::OK);

        // Tokens are single use
        let response = server
            .put("/api/auth/reset-password")
            .json(&json!({ "token": token, "password": "another-pass" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "Invalid or expired token");
    }
}
