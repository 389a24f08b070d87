//! Slug normalization.
//!
//! Uniqueness probing happens against the store (see the infra crate); this
//! module only derives the base token from a title.

use crate::domain::MAX_SLUG_LEN;

/// Fallback base when a title contains no usable characters.
const EMPTY_TITLE_FALLBACK: &str = "post";

/// Derive a URL-safe base slug from a title.
///
/// Lowercases, keeps ASCII alphanumerics, and collapses every other run of
/// characters into a single hyphen. A title with no usable characters still
/// yields a non-empty base, since the schema requires a unique non-null slug.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        return EMPTY_TITLE_FALLBACK.to_string();
    }

    // Leave room for a collision suffix.
    slug.truncate(MAX_SLUG_LEN - 12);
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Candidate slug for the Nth collision probe: the base itself for 0,
/// `base-N` afterwards.
pub fn candidate(base: &str, n: u32) -> String {
    if n == 0 {
        base.to_string()
    } else {
        format!("{base}-{n}")
    }
}
