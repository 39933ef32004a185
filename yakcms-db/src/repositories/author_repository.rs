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
use sqlx::SqlitePool;
use yakcms_core::models::author::{Author, AuthorRole};
use yakcms_core::CmsError;

use super::{format_datetime, parse_datetime};

pub struct AuthorRepository {
    pool: SqlitePool,
}

type AuthorRow = (
    i64,            // id
    String,         // name
    String,         // email
    String,         // role
    Option<String>, // bio
    Option<String>, // avatar
    Option<String>, // password_hash
    bool,           // email_verified
    Option<String>, // totp_secret
    bool,           // totp_enabled
    String,         // created_at
    String,         // updated_at
);

const AUTHOR_COLUMNS: &str = "id, name, email, role, bio, avatar, password_hash, \
     email_verified, totp_secret, totp_enabled, created_at, updated_at";

impl AuthorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, author: &Author) -> Result<i64> {
        author.is_valid().map_err(CmsError::validation)?;

        if self.find_by_email(&author.email).await?.is_some() {
            return Err(CmsError::conflict("Email already in use").into());
        }

        let result = sqlx::query(
            r#"
            INSERT INTO authors (name, email, role, bio, avatar, password_hash,
                                 email_verified, totp_secret, totp_enabled, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&author.name)
        .bind(&author.email)
        .bind(author.role.as_str())
        .bind(&author.bio)
        .bind(&author.avatar)
        .bind(&author.password_hash)
        .bind(author.email_verified)
        .bind(&author.totp_secret)
        .bind(author.totp_enabled)
        .bind(format_datetime(author.created_at))
        .bind(format_datetime(author.updated_at))
        .execute(&self.pool)
        .await
        .context("Failed to create author")?;

        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Author>> {
        let row = sqlx::query_as::<_, AuthorRow>(&format!(
            "SELECT {} FROM authors WHERE id = ?",
            AUTHOR_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find author by id")?;

        row.map(from_row).transpose()
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Author>> {
        let row = sqlx::query_as::<_, AuthorRow>(&format!(
            "SELECT {} FROM authors WHERE email = ?",
            AUTHOR_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find author by email")?;

        row.map(from_row).transpose()
    }

    pub async fn list(&self) -> Result<Vec<Author>> {
        let rows = sqlx::query_as::<_, AuthorRow>(&format!(
            "SELECT {} FROM authors ORDER BY name",
            AUTHOR_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list authors")?;

        rows.into_iter().map(from_row).collect()
    }

    /// Write back every mutable field of `author` (keyed by its id).
    pub async fn update(&self, author: &Author) -> Result<()> {
        author.is_valid().map_err(CmsError::validation)?;
        let id = author
            .id
            .ok_or_else(|| CmsError::validation("Author has no id"))?;

        // Another author may already hold the new email.
        if let Some(existing) = self.find_by_email(&author.email).await? {
            if existing.id != author.id {
                return Err(CmsError::conflict("Email already in use").into());
            }
        }

        let result = sqlx::query(
            r#"
            UPDATE authors
            SET name = ?, email = ?, role = ?, bio = ?, avatar = ?, password_hash = ?,
                email_verified = ?, totp_secret = ?, totp_enabled = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&author.name)
        .bind(&author.email)
        .bind(author.role.as_str())
        .bind(&author.bio)
        .bind(&author.avatar)
        .bind(&author.password_hash)
        .bind(author.email_verified)
        .bind(&author.totp_secret)
        .bind(author.totp_enabled)
        .bind(format_datetime(Utc::now()))
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update author")?;

        if result.rows_affected() == 0 {
            return Err(CmsError::not_found("Author not found").into());
        }
        Ok(())
    }

    /// Delete an author. Deleting the last remaining admin is forbidden.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let author = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| CmsError::not_found("Author not found"))?;

        if author.is_admin() && self.count_admins().await? <= 1 {
            return Err(CmsError::forbidden("Cannot delete last admin author").into());
        }

        sqlx::query("DELETE FROM authors WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete author")?;
        Ok(())
    }

    pub async fn count_admins(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM authors WHERE role = 'admin'")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count admins")?;
        Ok(count.0)
    }
}

fn from_row(row: AuthorRow) -> Result<Author> {
    let (
        id,
        name,
        email,
        role,
        bio,
        avatar,
        password_hash,
        email_verified,
        totp_secret,
        totp_enabled,
        created_at,
        updated_at,
    ) = row;

    Ok(Author {
        id: Some(id),
        name,
        email,
        role: AuthorRole::parse(&role).map_err(anyhow::Error::msg)?,
        bio,
        avatar,
        password_hash,
        email_verified,
        totp_secret,
        totp_enabled,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init::create_schema;
    use pretty_assertions::assert_eq;

    async fn setup() -> Result<AuthorRepository> {
        let pool = SqlitePool::connect(":memory:").await?;
        create_schema(&pool).await?;
        Ok(AuthorRepository::new(pool))
    }

    fn author(name: &str, email: &str, role: AuthorRole) -> Author {
        Author::new(name.to_string(), email.to_string(), role)
    }

    #[sqlx::test]
    async fn test_create_and_find() -> Result<()> {
        let repo = setup().await?;
        let id = repo
            .create(&author("Jane", "jane@example.com", AuthorRole::Admin))
            .await?;

        let found = repo.find_by_id(id).await?.expect("author should exist");
        assert_eq!(found.name, "Jane");
        assert_eq!(found.role, AuthorRole::Admin);
        assert!(!found.email_verified);
        Ok(())
    }

    #[sqlx::test]
    async fn test_duplicate_email_conflicts() -> Result<()> {
        let repo = setup().await?;
        repo.create(&author("Jane", "jane@example.com", AuthorRole::Admin))
            .await?;

        let err = repo
            .create(&author("Other", "jane@example.com", AuthorRole::Editor))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CmsError>(),
            Some(CmsError::Conflict(_))
        ));
        Ok(())
    }

    #[sqlx::test]
    async fn test_invalid_email_rejected() -> Result<()> {
        let repo = setup().await?;
        let err = repo
            .create(&author("Jane", "not-an-email", AuthorRole::Editor))
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<CmsError>(),
            Some(&CmsError::Validation("Invalid email format".into()))
        );
        Ok(())
    }

    #[sqlx::test]
    async fn test_cannot_delete_last_admin() -> Result<()> {
        let repo = setup().await?;
        let admin_id = repo
            .create(&author("Jane", "jane@example.com", AuthorRole::Admin))
            .await?;

        let err = repo.delete(admin_id).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<CmsError>(),
            Some(&CmsError::Forbidden("Cannot delete last admin author".into()))
        );

        // A second admin lifts the restriction.
        repo.create(&author("John", "john@example.com", AuthorRole::Admin))
            .await?;
        repo.delete(admin_id).await?;
        assert!(repo.find_by_id(admin_id).await?.is_none());
        Ok(())
    }

    #[sqlx::test]
    async fn test_delete_non_admin_is_unrestricted() -> Result<()> {
        let repo = setup().await?;
        repo.create(&author("Jane", "jane@example.com", AuthorRole::Admin))
            .await?;
        let editor_id = repo
            .create(&author("Ed", "ed@example.com", AuthorRole::Editor))
            .await?;

        repo.delete(editor_id).await?;
        assert_eq!(repo.count_admins().await?, 1);
        Ok(())
    }

    #[sqlx::test]
    async fn test_update_changes_fields_and_guards_email() -> Result<()> {
        let repo = setup().await?;
        let id = repo
            .create(&author("Jane", "jane@example.com", AuthorRole::Admin))
            .await?;
        repo.create(&author("John", "john@example.com", AuthorRole::Editor))
            .await?;

        let mut jane = repo.find_by_id(id).await?.unwrap();
        jane.bio = Some("Editor in chief".to_string());
        repo.update(&jane).await?;
        assert_eq!(
            repo.find_by_id(id).await?.unwrap().bio.as_deref(),
            Some("Editor in chief")
        );

        jane.email = "john@example.com".to_string();
        let err = repo.update(&jane).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CmsError>(),
            Some(CmsError::Conflict(_))
        ));
        Ok(())
    }
}
