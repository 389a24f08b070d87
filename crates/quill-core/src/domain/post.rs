use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum length accepted for a post title.
pub const MAX_TITLE_LEN: usize = 500;
/// Maximum length of a generated slug, suffix included.
pub const MAX_SLUG_LEN: usize = 500;

/// Post lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
    Scheduled,
    Archived,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Scheduled => "scheduled",
            PostStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(PostStatus::Draft),
            "published" => Some(PostStatus::Published),
            "scheduled" => Some(PostStatus::Scheduled),
            "archived" => Some(PostStatus::Archived),
            _ => None,
        }
    }

    /// Lenient parse used at creation time: anything unrecognized is a draft.
    pub fn parse_or_draft(s: Option<&str>) -> Self {
        s.and_then(Self::parse).unwrap_or(PostStatus::Draft)
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Post entity - a single blog post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image_url: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub status: PostStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// A post may be scheduled only while it is still a draft.
    pub fn can_schedule(&self) -> bool {
        self.status == PostStatus::Draft
    }

    /// Publishing is valid from draft, scheduled, and archived.
    pub fn can_publish(&self) -> bool {
        !matches!(self.status, PostStatus::Published)
    }

    /// The draft-deletion path is restricted to drafts.
    pub fn is_draft(&self) -> bool {
        self.status == PostStatus::Draft
    }

    /// Whether the post is due for the scheduled-publish sweep.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == PostStatus::Scheduled
            && self.scheduled_at.is_some_and(|at| at <= now)
    }
}

/// A post together with its association sets and aggregate view count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostWithRelations {
    #[serde(flatten)]
    pub post: Post,
    pub category_ids: Vec<Uuid>,
    pub tag_ids: Vec<Uuid>,
    pub view_count: u64,
}

/// Minimal projection of a published post, returned by the sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: Uuid,
    pub title: String,
    pub published_at: DateTime<Utc>,
}

/// Input for creating a post. The author is resolved by the service from
/// the requesting principal, never taken from the payload.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image_url: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub status: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub category_ids: Vec<Uuid>,
    pub tag_ids: Vec<Uuid>,
}

/// Three-way update marker for a nullable field: leave alone, set, or clear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Field<T> {
    #[default]
    Keep,
    Set(T),
    Clear,
}

impl<T> Field<T> {
    /// Build from an optional request field, where absence means "keep".
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(v) => Field::Set(v),
            None => Field::Keep,
        }
    }

    pub fn is_keep(&self) -> bool {
        matches!(self, Field::Keep)
    }

    /// Resolve against the currently stored value.
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Field::Keep => current,
            Field::Set(v) => Some(v),
            Field::Clear => None,
        }
    }
}

/// Deterministic partial update consumed by the post store.
///
/// Every field is explicitly present-with-value or absent; `tag_ids` and
/// `category_ids` replace the whole association set when present (an empty
/// vec clears it). `snapshot_by` asks the store to capture the pre-write
/// state as a new version inside the same transaction.
#[derive(Debug, Clone, Default)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Field<String>,
    pub featured_image_url: Field<String>,
    pub meta_title: Field<String>,
    pub meta_description: Field<String>,
    pub tag_ids: Option<Vec<Uuid>>,
    pub category_ids: Option<Vec<Uuid>>,
    pub regenerate_slug: bool,
    pub snapshot_by: Option<Uuid>,
}

impl PostUpdate {
    /// Whether this update touches any versioned content field.
    pub fn touches_content(&self) -> bool {
        self.title.is_some() || self.content.is_some() || !self.excerpt.is_keep()
    }

    pub fn is_empty(&self) -> bool {
        !self.touches_content()
            && self.featured_image_url.is_keep()
            && self.meta_title.is_keep()
            && self.meta_description.is_keep()
            && self.tag_ids.is_none()
            && self.category_ids.is_none()
    }
}
