use once_cell::sync::Lazy;
use regex::Regex;

static NON_ALNUM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("Failed to compile slug regex"));

/// Derive a URL-safe identifier from a title.
///
/// Lowercases, collapses every run of non-alphanumeric characters to a
/// single hyphen, and strips hyphens from both ends. Deterministic and
/// idempotent: slugging a slug returns it unchanged.
pub fn generate_slug_from_title(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    let mut slug = NON_ALNUM.replace_all(&lowered, "-").to_string();
    slug = slug.trim_matches('-').to_string();

    if slug.is_empty() {
        return "untitled".to_string();
    }

    // Keep URLs to a sane length
    if slug.len() > 100 {
        slug = slug
            .chars()
            .take(100)
            .collect::<String>()
            .trim_end_matches('-')
            .to_string();
    }

    slug
}
