//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to create a post. `status` defaults to draft; unknown values
/// are treated as draft. Supplying `tag_ids`/`category_ids` sets the
/// initial association sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub featured_image_url: Option<String>,
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub category_ids: Option<Vec<Uuid>>,
    #[serde(default)]
    pub tag_ids: Option<Vec<Uuid>>,
}

/// Partial update. Absent fields are left untouched; a supplied tag or
/// category list (even an empty one) replaces the whole set.
/// `create_version` (default true) controls the pre-update snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub featured_image_url: Option<String>,
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub category_ids: Option<Vec<Uuid>>,
    #[serde(default)]
    pub tag_ids: Option<Vec<Uuid>>,
    #[serde(default)]
    pub create_version: Option<bool>,
}

/// Request to schedule a post for future publication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulePostRequest {
    pub scheduled_at: DateTime<Utc>,
}

/// A post as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image_url: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub status: String,
    pub published_at: Option<DateTime<Utc>>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A post with its association sets and aggregate view count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetailResponse {
    #[serde(flatten)]
    pub post: PostResponse,
    pub category_ids: Vec<Uuid>,
    pub tag_ids: Vec<Uuid>,
    pub view_count: u64,
}

/// Paginated listing envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

/// One version snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionResponse {
    pub id: Uuid,
    pub post_id: Uuid,
    pub version_number: i32,
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// One entry in the sweep result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedPostResponse {
    pub id: Uuid,
    pub title: String,
    pub published_at: DateTime<Utc>,
}

/// Result of a sweep-publish invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepResponse {
    pub published: Vec<PublishedPostResponse>,
}

/// Aggregate view count for a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewCountResponse {
    pub post_id: Uuid,
    pub view_count: u64,
}

/// Full-replace settings write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSettingsRequest {
    pub blog_title: String,
    #[serde(default)]
    pub blog_tagline: Option<String>,
    #[serde(default)]
    pub blog_description: Option<String>,
    pub posts_per_page: i32,
    pub allow_comments: bool,
}

/// Blog settings as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsResponse {
    pub blog_title: String,
    pub blog_tagline: Option<String>,
    pub blog_description: Option<String>,
    pub posts_per_page: i32,
    pub allow_comments: bool,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}
