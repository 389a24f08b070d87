use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable snapshot of a post's editable content.
///
/// Version numbers are contiguous per post, starting at 1, and are never
/// reused or renumbered. Rows are only ever appended; deletion happens
/// solely as a cascade of the owning post's deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostVersion {
    pub id: Uuid,
    pub post_id: Uuid,
    pub version_number: i32,
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}
