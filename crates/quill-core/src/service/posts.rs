use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Actor, Field, NewPost, Post, PostStatus, PostSummary, PostUpdate, PostView,
    PostWithRelations, MAX_TITLE_LEN,
};
use crate::error::DomainError;
use crate::ports::{
    Clock, CreatePost, Page, PostQuery, PostRepository, TagValidator, VersionRepository,
    ViewRepository,
};

/// Policy for the creation endpoint. Unauthenticated creation is a
/// development-mode carve-out and is disabled unless explicitly enabled;
/// when enabled, posts are attributed to the configured fallback author.
#[derive(Debug, Clone)]
pub struct CreationPolicy {
    pub allow_unauthenticated: bool,
    pub fallback_author: Uuid,
}

impl Default for CreationPolicy {
    fn default() -> Self {
        Self {
            allow_unauthenticated: false,
            fallback_author: Uuid::nil(),
        }
    }
}

/// Partial edit accepted by [`PostService::update_post`].
///
/// Absent fields are left untouched; a supplied tag or category list
/// (even empty) replaces the whole association set. `create_version`
/// defaults to true and controls the pre-write snapshot.
#[derive(Debug, Clone)]
pub struct EditPost {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Field<String>,
    pub featured_image_url: Field<String>,
    pub meta_title: Field<String>,
    pub meta_description: Field<String>,
    pub tag_ids: Option<Vec<Uuid>>,
    pub category_ids: Option<Vec<Uuid>>,
    pub create_version: bool,
}

impl Default for EditPost {
    fn default() -> Self {
        Self {
            title: None,
            content: None,
            excerpt: Field::Keep,
            featured_image_url: Field::Keep,
            meta_title: Field::Keep,
            meta_description: Field::Keep,
            tag_ids: None,
            category_ids: None,
            create_version: true,
        }
    }
}

/// The post lifecycle manager.
///
/// Owns every state transition of a post and the versioning-on-write
/// policy; consults the slug rules and version store through the post
/// repository and calls out to the tag validator when tags change.
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    versions: Arc<dyn VersionRepository>,
    views: Arc<dyn ViewRepository>,
    tag_validator: Arc<dyn TagValidator>,
    clock: Arc<dyn Clock>,
    creation: CreationPolicy,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        versions: Arc<dyn VersionRepository>,
        views: Arc<dyn ViewRepository>,
        tag_validator: Arc<dyn TagValidator>,
        clock: Arc<dyn Clock>,
        creation: CreationPolicy,
    ) -> Self {
        Self {
            posts,
            versions,
            views,
            tag_validator,
            clock,
            creation,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Load a post and check the uniform modify/privileged-read rule.
    async fn load_authorized(&self, actor: &Actor, id: Uuid) -> Result<Post, DomainError> {
        let post = self
            .posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", id))?;
        if !actor.can_modify(&post) {
            return Err(DomainError::Forbidden);
        }
        Ok(post)
    }

    fn validate_title(title: &str) -> Result<(), DomainError> {
        if title.trim().is_empty() {
            return Err(DomainError::validation("title must not be empty"));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(DomainError::validation(format!(
                "title exceeds {MAX_TITLE_LEN} characters"
            )));
        }
        Ok(())
    }

    fn validate_content(content: &str) -> Result<(), DomainError> {
        if content.trim().is_empty() {
            return Err(DomainError::validation("content must not be empty"));
        }
        Ok(())
    }

    /// Create a post, defaulting to draft. Version 1 mirroring the initial
    /// content and the unique slug are produced by the store in the same
    /// transaction as the insert.
    pub async fn create_post(
        &self,
        actor: Option<&Actor>,
        input: NewPost,
    ) -> Result<Post, DomainError> {
        let author_id = match actor {
            Some(actor) => actor.id,
            None if self.creation.allow_unauthenticated => self.creation.fallback_author,
            None => return Err(DomainError::Forbidden),
        };

        Self::validate_title(&input.title)?;
        Self::validate_content(&input.content)?;

        let now = self.now();
        let status = PostStatus::parse_or_draft(input.status.as_deref());

        let scheduled_at = match status {
            PostStatus::Scheduled => {
                let at = input.scheduled_at.ok_or_else(|| {
                    DomainError::validation("scheduled posts require a scheduled_at time")
                })?;
                if at <= now {
                    return Err(DomainError::validation(
                        "scheduled_at must be in the future",
                    ));
                }
                Some(at)
            }
            _ => None,
        };
        let published_at = (status == PostStatus::Published).then_some(now);

        if !input.tag_ids.is_empty() {
            self.tag_validator.validate(&input.tag_ids).await?;
        }

        let post = self
            .posts
            .create(CreatePost {
                author_id,
                title: input.title,
                content: input.content,
                excerpt: input.excerpt,
                featured_image_url: input.featured_image_url,
                meta_title: input.meta_title,
                meta_description: input.meta_description,
                status,
                published_at,
                scheduled_at,
                category_ids: input.category_ids,
                tag_ids: input.tag_ids,
                now,
            })
            .await?;

        tracing::info!(post_id = %post.id, slug = %post.slug, status = %post.status, "Post created");
        Ok(post)
    }

    /// Fetch a post with its categories, tags, and view count. Published
    /// posts are public; anything else requires the author or a
    /// privileged role.
    pub async fn get_post(
        &self,
        actor: Option<&Actor>,
        id: Uuid,
    ) -> Result<PostWithRelations, DomainError> {
        let full = self
            .posts
            .find_with_relations(id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", id))?;

        if full.post.status != PostStatus::Published {
            match actor {
                Some(actor) if actor.can_modify(&full.post) => {}
                _ => return Err(DomainError::Forbidden),
            }
        }
        Ok(full)
    }

    /// List posts. The default filter shows only published posts; asking
    /// for other statuses requires authentication, and non-privileged
    /// actors are constrained to their own posts.
    pub async fn list_posts(
        &self,
        actor: Option<&Actor>,
        query: PostQuery,
    ) -> Result<Page<Post>, DomainError> {
        let mut query = query.normalized();

        if query.status != Some(PostStatus::Published) {
            let actor = actor.ok_or(DomainError::Forbidden)?;
            if !actor.role.is_privileged() {
                query.author_id = Some(actor.id);
            }
        }
        Ok(self.posts.list(&query).await?)
    }

    /// Partial update. When content fields change and a snapshot is
    /// requested (the default), the pre-update state is captured as a new
    /// version inside the same transaction, before the overwrite. A title
    /// change regenerates the slug, excluding this post's own row from
    /// the collision probe.
    pub async fn update_post(
        &self,
        actor: &Actor,
        id: Uuid,
        edit: EditPost,
    ) -> Result<Post, DomainError> {
        let post = self.load_authorized(actor, id).await?;

        if let Some(title) = &edit.title {
            Self::validate_title(title)?;
        }
        if let Some(content) = &edit.content {
            Self::validate_content(content)?;
        }

        if let Some(tag_ids) = &edit.tag_ids {
            self.tag_validator.validate(tag_ids).await?;
        }

        let regenerate_slug = edit
            .title
            .as_ref()
            .is_some_and(|title| *title != post.title);

        let update = PostUpdate {
            snapshot_by: (edit.create_version
                && (edit.title.is_some()
                    || edit.content.is_some()
                    || !edit.excerpt.is_keep()))
            .then_some(actor.id),
            title: edit.title,
            content: edit.content,
            excerpt: edit.excerpt,
            featured_image_url: edit.featured_image_url,
            meta_title: edit.meta_title,
            meta_description: edit.meta_description,
            tag_ids: edit.tag_ids,
            category_ids: edit.category_ids,
            regenerate_slug,
        };

        let updated = self.posts.apply_update(id, update, self.now()).await?;
        tracing::debug!(post_id = %id, "Post updated");
        Ok(updated)
    }

    /// Delete a post and everything hanging off it.
    pub async fn delete_post(&self, actor: &Actor, id: Uuid) -> Result<(), DomainError> {
        self.load_authorized(actor, id).await?;
        self.posts.delete(id).await?;
        tracing::info!(post_id = %id, "Post deleted");
        Ok(())
    }

    /// Draft-only deletion path.
    pub async fn delete_draft(&self, actor: &Actor, id: Uuid) -> Result<(), DomainError> {
        let post = self.load_authorized(actor, id).await?;
        if !post.is_draft() {
            return Err(DomainError::validation(
                "only draft posts can be deleted through the draft path",
            ));
        }
        self.posts.delete(id).await?;
        tracing::info!(post_id = %id, "Draft deleted");
        Ok(())
    }

    /// Publish immediately, from draft, scheduled, or archived.
    pub async fn publish_post(&self, actor: &Actor, id: Uuid) -> Result<Post, DomainError> {
        let post = self.load_authorized(actor, id).await?;
        if !post.can_publish() {
            return Err(DomainError::validation("post is already published"));
        }
        let published = self.posts.mark_published(id, self.now()).await?;
        tracing::info!(post_id = %id, "Post published");
        Ok(published)
    }

    /// Schedule a draft for future publication.
    pub async fn schedule_post(
        &self,
        actor: &Actor,
        id: Uuid,
        scheduled_at: DateTime<Utc>,
    ) -> Result<Post, DomainError> {
        let post = self.load_authorized(actor, id).await?;
        if !post.can_schedule() {
            return Err(DomainError::validation(
                "only draft posts can be scheduled",
            ));
        }
        let now = self.now();
        if scheduled_at <= now {
            return Err(DomainError::validation(
                "scheduled_at must be in the future",
            ));
        }
        let scheduled = self.posts.mark_scheduled(id, scheduled_at, now).await?;
        tracing::info!(post_id = %id, scheduled_at = %scheduled_at, "Post scheduled");
        Ok(scheduled)
    }

    /// Posts currently due for publication, oldest first.
    pub async fn list_due(&self) -> Result<Vec<Post>, DomainError> {
        Ok(self.posts.find_due_scheduled(self.now()).await?)
    }

    /// Publish every due scheduled post, each in its own transaction.
    ///
    /// A failing post is logged and skipped so it cannot block the rest;
    /// a post already published by a racing sweep is silently skipped.
    /// Invoking the sweep when nothing is due is a no-op.
    pub async fn sweep_publish(&self) -> Result<Vec<PostSummary>, DomainError> {
        let now = self.now();
        let due = self.posts.find_due_scheduled(now).await?;
        if due.is_empty() {
            return Ok(Vec::new());
        }

        let mut published = Vec::with_capacity(due.len());
        for post in due {
            match self.posts.publish_if_scheduled(post.id, now).await {
                Ok(true) => {
                    tracing::info!(post_id = %post.id, title = %post.title, "Scheduled post published");
                    published.push(PostSummary {
                        id: post.id,
                        title: post.title,
                        published_at: now,
                    });
                }
                Ok(false) => {
                    tracing::debug!(post_id = %post.id, "Post no longer scheduled, skipping");
                }
                Err(e) => {
                    tracing::warn!(post_id = %post.id, error = %e, "Failed to publish scheduled post, skipping");
                }
            }
        }
        Ok(published)
    }

    pub async fn list_versions(
        &self,
        actor: &Actor,
        post_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<Page<crate::domain::PostVersion>, DomainError> {
        self.load_authorized(actor, post_id).await?;
        let page = page.max(1);
        let per_page = per_page.clamp(1, crate::ports::MAX_PAGE_SIZE);
        Ok(self.versions.list_for_post(post_id, page, per_page).await?)
    }

    pub async fn get_version(
        &self,
        actor: &Actor,
        post_id: Uuid,
        version_number: i32,
    ) -> Result<crate::domain::PostVersion, DomainError> {
        self.load_authorized(actor, post_id).await?;
        self.versions
            .find_by_number(post_id, version_number)
            .await?
            .ok_or_else(|| DomainError::not_found("version", version_number))
    }

    /// Manual snapshot of the post's current content.
    pub async fn create_version(
        &self,
        actor: &Actor,
        post_id: Uuid,
    ) -> Result<crate::domain::PostVersion, DomainError> {
        self.load_authorized(actor, post_id).await?;
        let version = self
            .versions
            .append_snapshot(post_id, actor.id, self.now())
            .await?;
        tracing::info!(post_id = %post_id, version = version.version_number, "Version saved");
        Ok(version)
    }

    /// Restore an older version: the current state is snapshotted first so
    /// it is never lost, then title/content/excerpt are overwritten with
    /// the target version's values. Status, slug, and publication
    /// timestamps are untouched.
    pub async fn restore_version(
        &self,
        actor: &Actor,
        post_id: Uuid,
        version_number: i32,
    ) -> Result<Post, DomainError> {
        self.load_authorized(actor, post_id).await?;
        let version = self
            .versions
            .find_by_number(post_id, version_number)
            .await?
            .ok_or_else(|| DomainError::not_found("version", version_number))?;

        let update = PostUpdate {
            title: Some(version.title),
            content: Some(version.content),
            excerpt: match version.excerpt {
                Some(excerpt) => Field::Set(excerpt),
                None => Field::Clear,
            },
            snapshot_by: Some(actor.id),
            regenerate_slug: false,
            ..PostUpdate::default()
        };

        let restored = self.posts.apply_update(post_id, update, self.now()).await?;
        tracing::info!(post_id = %post_id, version = version_number, "Version restored");
        Ok(restored)
    }

    /// Record a page view. Every hit counts: no deduplication by IP or
    /// user agent.
    pub async fn record_view(
        &self,
        post_id: Uuid,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<(), DomainError> {
        self.posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))?;
        self.views
            .record(PostView::new(post_id, ip_address, user_agent, self.now()))
            .await?;
        Ok(())
    }

    pub async fn view_count(&self, post_id: Uuid) -> Result<u64, DomainError> {
        self.posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))?;
        Ok(self.views.count_for_post(post_id).await?)
    }
}
