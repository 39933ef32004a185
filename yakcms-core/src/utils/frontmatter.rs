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

//! The persisted text representation of a post: a `---` delimited
//! `key: value` metadata header followed by the body content.

use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;

use crate::models::post::{Post, PostStatus};

const DELIMITER: &str = "---";

/// Render a post as a frontmatter document.
///
/// Optional fields are omitted when absent; dates are RFC 3339; `pubDate`
/// is the publish instant when one exists, the creation time otherwise.
pub fn serialize_post(post: &Post) -> String {
    let mut lines = Vec::new();
    lines.push(DELIMITER.to_string());
    lines.push(format!("title: {}", quote(&post.title)));
    if let Some(description) = &post.description {
        lines.push(format!("description: {}", quote(description)));
    }
    let pub_date = post.published_at.unwrap_or(post.created_at);
    lines.push(format!("pubDate: {}", quote(&rfc3339(pub_date))));
    lines.push(format!("updatedDate: {}", quote(&rfc3339(post.updated_at))));
    lines.push(format!("author: {}", quote(&post.author)));
    lines.push(format!("draft: {}", post.status == PostStatus::Draft));
    lines.push(format!("featured: {}", post.featured));
    let tags = post
        .tags
        .iter()
        .map(|t| quote(t))
        .collect::<Vec<_>>()
        .join(", ");
    lines.push(format!("tags: [{}]", tags));
    if let Some(category) = &post.category {
        lines.push(format!("category: {}", quote(category)));
    }
    if let Some(image) = &post.cover_image {
        lines.push(format!("image: {}", quote(image)));
    }
    lines.push(DELIMITER.to_string());
    lines.push(String::new());
    lines.push(post.body.clone());

    let mut out = lines.join("\n");
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Parsed form of a frontmatter document.
#[derive(Debug, Clone, PartialEq)]
pub struct Frontmatter {
    pub fields: BTreeMap<String, String>,
    pub tags: Vec<String>,
    pub draft: bool,
    pub featured: bool,
    pub body: String,
}

impl Frontmatter {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(|s| s.as_str())
    }

    pub fn date(&self, key: &str) -> Option<DateTime<Utc>> {
        self.get(key)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Parse a frontmatter document produced by [`serialize_post`].
pub fn parse(input: &str) -> Result<Frontmatter, String> {
    let mut lines = input.lines();
    if lines.next() != Some(DELIMITER) {
        return Err("Missing frontmatter opening delimiter".to_string());
    }

    let mut fields = BTreeMap::new();
    let mut tags = Vec::new();
    let mut draft = false;
    let mut featured = false;
    let mut closed = false;

    for line in lines.by_ref() {
        if line == DELIMITER {
            closed = true;
            break;
        }
        let (key, raw) = line
            .split_once(':')
            .ok_or_else(|| format!("Malformed frontmatter line: {}", line))?;
        let key = key.trim();
        let raw = raw.trim();
        match key {
            "draft" => draft = raw == "true",
            "featured" => featured = raw == "true",
            "tags" => tags = parse_list(raw)?,
            _ => {
                fields.insert(key.to_string(), unquote(raw));
            }
        }
    }

    if !closed {
        return Err("Missing frontmatter closing delimiter".to_string());
    }

    let body = lines.collect::<Vec<_>>().join("\n");
    let body = body.strip_prefix('\n').unwrap_or(&body).to_string();

    Ok(Frontmatter {
        fields,
        tags,
        draft,
        featured,
        body,
    })
}

fn rfc3339(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\\\""))
}

fn unquote(s: &str) -> String {
    let trimmed = s.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed[1..trimmed.len() - 1].replace("\\\"", "\"")
    } else {
        trimmed.to_string()
    }
}

fn parse_list(raw: &str) -> Result<Vec<String>, String> {
    let inner = raw
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| format!("Malformed tag list: {}", raw))?;
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(inner.split(',').map(unquote).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_post() -> Post {
        let mut post = Post::new_with_title(
            "Test Post".to_string(),
            "# Heading\n\nSome content.".to_string(),
            "jane".to_string(),
        );
        post.description = Some("A test".to_string());
        post.tags = vec!["rust".to_string(), "cms".to_string()];
        post.category = Some("engineering".to_string());
        post.cover_image = Some("media/hero.png".to_string());
        post
    }

    #[test]
    fn test_serialize_layout() {
        let doc = serialize_post(&sample_post());
        assert!(doc.starts_with("---\ntitle: \"Test Post\"\n"));
        assert!(doc.contains("\ndraft: true\n"));
        assert!(doc.contains("\ntags: [\"rust\", \"cms\"]\n"));
        assert!(doc.contains("\ncategory: \"engineering\"\n"));
        assert!(doc.contains("\nimage: \"media/hero.png\"\n"));
        assert!(doc.contains("\n---\n\n# Heading\n\nSome content.\n"));
    }

    #[test]
    fn test_round_trip() {
        let post = sample_post();
        let fm = parse(&serialize_post(&post)).unwrap();
        assert_eq!(fm.get("title"), Some("Test Post"));
        assert_eq!(fm.get("description"), Some("A test"));
        assert_eq!(fm.get("author"), Some("jane"));
        assert_eq!(fm.tags, vec!["rust", "cms"]);
        assert!(fm.draft);
        assert!(!fm.featured);
        assert_eq!(fm.body, "# Heading\n\nSome content.");
        assert_eq!(fm.date("updatedDate").unwrap().timestamp(), post.updated_at.timestamp());
    }

    #[test]
    fn test_quotes_in_title_survive() {
        let mut post = sample_post();
        post.title = "She said \"hi\"".to_string();
        let fm = parse(&serialize_post(&post)).unwrap();
        assert_eq!(fm.get("title"), Some("She said \"hi\""));
    }

    #[test]
    fn test_empty_tags() {
        let mut post = sample_post();
        post.tags.clear();
        let fm = parse(&serialize_post(&post)).unwrap();
        assert!(fm.tags.is_empty());
    }

    #[test]
    fn test_parse_rejects_missing_delimiters() {
        assert!(parse("title: \"x\"").is_err());
        assert!(parse("---\ntitle: \"x\"\nno closing").is_err());
    }

    #[test]
    fn test_parse_rejects_malformed_line() {
        let err = parse("---\njust-a-token\n---\n").unwrap_err();
        assert!(err.contains("Malformed frontmatter line"));
    }
}
