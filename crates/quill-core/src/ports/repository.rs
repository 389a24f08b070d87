use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{BlogSettings, Post, PostStatus, PostUpdate, PostVersion, PostView, PostWithRelations};
use crate::error::RepoError;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Sortable post fields - a closed allow-list, never raw column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostSort {
    CreatedAt,
    UpdatedAt,
    PublishedAt,
    ScheduledAt,
    Title,
}

impl PostSort {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created_at" => Some(Self::CreatedAt),
            "updated_at" => Some(Self::UpdatedAt),
            "published_at" => Some(Self::PublishedAt),
            "scheduled_at" => Some(Self::ScheduledAt),
            "title" => Some(Self::Title),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Listing filter. `status: None` means "all statuses" and must be an
/// explicit override; the default shows published posts only.
#[derive(Debug, Clone)]
pub struct PostQuery {
    pub status: Option<PostStatus>,
    pub author_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub tag_id: Option<Uuid>,
    pub search: Option<String>,
    pub sort: PostSort,
    pub direction: SortDirection,
    pub page: u64,
    pub per_page: u64,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            status: Some(PostStatus::Published),
            author_id: None,
            category_id: None,
            tag_id: None,
            search: None,
            sort: PostSort::CreatedAt,
            direction: SortDirection::Desc,
            page: 1,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PostQuery {
    /// Clamp pagination to valid bounds.
    pub fn normalized(mut self) -> Self {
        self.page = self.page.max(1);
        self.per_page = self.per_page.clamp(1, MAX_PAGE_SIZE);
        self
    }
}

/// One page of results plus the total match count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

/// Creation input handed to the store. The store derives the unique slug
/// from the title inside the write transaction and records version 1.
#[derive(Debug, Clone)]
pub struct CreatePost {
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image_url: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub status: PostStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub category_ids: Vec<Uuid>,
    pub tag_ids: Vec<Uuid>,
    pub now: DateTime<Utc>,
}

/// Post store. Every multi-step write method is a single transaction:
/// either the whole unit commits or nothing is observable.
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError>;

    /// Post plus category/tag sets and aggregate view count.
    async fn find_with_relations(&self, id: Uuid)
    -> Result<Option<PostWithRelations>, RepoError>;

    async fn list(&self, query: &PostQuery) -> Result<Page<Post>, RepoError>;

    /// Insert post + association rows + version 1 atomically, assigning a
    /// collision-free slug.
    async fn create(&self, input: CreatePost) -> Result<Post, RepoError>;

    /// Apply a partial update atomically: optional pre-write version
    /// snapshot, optional slug regeneration (excluding this post's own
    /// row), full replacement of supplied association sets, field writes.
    async fn apply_update(
        &self,
        id: Uuid,
        update: PostUpdate,
        now: DateTime<Utc>,
    ) -> Result<Post, RepoError>;

    /// Delete the post; versions, links, and views go with it.
    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;

    /// Unconditional publish: sets status and `published_at`, clears
    /// `scheduled_at`.
    async fn mark_published(&self, id: Uuid, now: DateTime<Utc>) -> Result<Post, RepoError>;

    /// Move a draft to scheduled at the given instant.
    async fn mark_scheduled(
        &self,
        id: Uuid,
        scheduled_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Post, RepoError>;

    /// All posts with status `scheduled` and `scheduled_at <= now`,
    /// oldest first.
    async fn find_due_scheduled(&self, now: DateTime<Utc>) -> Result<Vec<Post>, RepoError>;

    /// Conditional single-post publish used by the sweep: the update
    /// requires the row to still be scheduled and due. Returns `false`
    /// when a racing sweep got there first - that is not an error.
    async fn publish_if_scheduled(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, RepoError>;
}

/// Append-only version store.
#[async_trait]
pub trait VersionRepository: Send + Sync {
    async fn list_for_post(
        &self,
        post_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<Page<PostVersion>, RepoError>;

    async fn find_by_number(
        &self,
        post_id: Uuid,
        version_number: i32,
    ) -> Result<Option<PostVersion>, RepoError>;

    /// Manual snapshot: capture the post's current content as the next
    /// version number, computed inside the same transaction.
    async fn append_snapshot(
        &self,
        post_id: Uuid,
        created_by: Uuid,
        now: DateTime<Utc>,
    ) -> Result<PostVersion, RepoError>;
}

/// Append-only view counter.
#[async_trait]
pub trait ViewRepository: Send + Sync {
    async fn record(&self, view: PostView) -> Result<(), RepoError>;

    async fn count_for_post(&self, post_id: Uuid) -> Result<u64, RepoError>;
}

/// Singleton settings store.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Read the singleton row, lazily materializing defaults if absent.
    async fn get_or_create(&self, now: DateTime<Utc>) -> Result<BlogSettings, RepoError>;

    /// Full-replace upsert keyed by the fixed singleton id.
    async fn upsert(&self, settings: BlogSettings) -> Result<BlogSettings, RepoError>;
}
