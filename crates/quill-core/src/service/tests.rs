//! Service tests against in-memory fakes of the storage and validator
//! ports, with a controlled clock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::{
    Actor, BlogSettings, Field, NewPost, Post, PostStatus, PostUpdate, PostVersion, PostView,
    PostWithRelations, Role,
};
use crate::error::{DomainError, RepoError};
use crate::ports::{
    Clock, CreatePost, Page, PostQuery, PostRepository, PostSort, SettingsRepository,
    SortDirection, TagValidationError, TagValidator, VersionRepository, ViewRepository,
};
use crate::service::{CreationPolicy, EditPost, PostService, SettingsService, UpdateSettings};
use crate::slug;

#[derive(Default)]
struct MemState {
    posts: HashMap<Uuid, Post>,
    versions: Vec<PostVersion>,
    tags: HashMap<Uuid, Vec<Uuid>>,
    categories: HashMap<Uuid, Vec<Uuid>>,
    views: Vec<PostView>,
    settings: Option<BlogSettings>,
}

/// In-memory store implementing all repository ports, mirroring the
/// transactional semantics of the real store.
#[derive(Default)]
struct MemStore {
    state: Mutex<MemState>,
    /// When set, `publish_if_scheduled` fails for this post id.
    fail_publish: Mutex<Option<Uuid>>,
}

impl MemStore {
    fn unique_slug(state: &MemState, title: &str, exclude: Option<Uuid>) -> String {
        let base = slug::slugify(title);
        let mut n = 0;
        loop {
            let candidate = slug::candidate(&base, n);
            let taken = state
                .posts
                .values()
                .any(|p| p.slug == candidate && Some(p.id) != exclude);
            if !taken {
                return candidate;
            }
            n += 1;
        }
    }

    fn next_version_number(state: &MemState, post_id: Uuid) -> i32 {
        state
            .versions
            .iter()
            .filter(|v| v.post_id == post_id)
            .map(|v| v.version_number)
            .max()
            .unwrap_or(0)
            + 1
    }

    fn snapshot(state: &mut MemState, post_id: Uuid, created_by: Uuid, now: DateTime<Utc>) {
        let post = state.posts.get(&post_id).expect("post exists").clone();
        let version_number = Self::next_version_number(state, post_id);
        state.versions.push(PostVersion {
            id: Uuid::new_v4(),
            post_id,
            version_number,
            title: post.title,
            content: post.content,
            excerpt: post.excerpt,
            created_by,
            created_at: now,
        });
    }
}

#[async_trait]
impl PostRepository for MemStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.state.lock().unwrap().posts.get(&id).cloned())
    }

    async fn find_with_relations(
        &self,
        id: Uuid,
    ) -> Result<Option<PostWithRelations>, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state.posts.get(&id).cloned().map(|post| PostWithRelations {
            category_ids: state.categories.get(&id).cloned().unwrap_or_default(),
            tag_ids: state.tags.get(&id).cloned().unwrap_or_default(),
            view_count: state.views.iter().filter(|v| v.post_id == id).count() as u64,
            post,
        }))
    }

    async fn list(&self, query: &PostQuery) -> Result<Page<Post>, RepoError> {
        let state = self.state.lock().unwrap();
        let mut matches: Vec<Post> = state
            .posts
            .values()
            .filter(|p| query.status.is_none_or(|s| p.status == s))
            .filter(|p| query.author_id.is_none_or(|a| p.author_id == a))
            .filter(|p| {
                query.tag_id.is_none_or(|t| {
                    state.tags.get(&p.id).is_some_and(|ids| ids.contains(&t))
                })
            })
            .filter(|p| {
                query.category_id.is_none_or(|c| {
                    state
                        .categories
                        .get(&p.id)
                        .is_some_and(|ids| ids.contains(&c))
                })
            })
            .filter(|p| {
                query.search.as_deref().is_none_or(|s| {
                    let s = s.to_lowercase();
                    p.title.to_lowercase().contains(&s)
                        || p.content.to_lowercase().contains(&s)
                        || p.excerpt
                            .as_deref()
                            .is_some_and(|e| e.to_lowercase().contains(&s))
                })
            })
            .cloned()
            .collect();

        matches.sort_by(|a, b| {
            let ord = match query.sort {
                PostSort::CreatedAt => a.created_at.cmp(&b.created_at),
                PostSort::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                PostSort::PublishedAt => a.published_at.cmp(&b.published_at),
                PostSort::ScheduledAt => a.scheduled_at.cmp(&b.scheduled_at),
                PostSort::Title => a.title.cmp(&b.title),
            };
            match query.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });

        let total = matches.len() as u64;
        let start = ((query.page - 1) * query.per_page) as usize;
        let items = matches
            .into_iter()
            .skip(start)
            .take(query.per_page as usize)
            .collect();
        Ok(Page {
            items,
            page: query.page,
            per_page: query.per_page,
            total,
        })
    }

    async fn create(&self, input: CreatePost) -> Result<Post, RepoError> {
        let mut state = self.state.lock().unwrap();
        let slug = Self::unique_slug(&state, &input.title, None);
        let id = Uuid::new_v4();
        let post = Post {
            id,
            author_id: input.author_id,
            title: input.title,
            slug,
            content: input.content,
            excerpt: input.excerpt,
            featured_image_url: input.featured_image_url,
            meta_title: input.meta_title,
            meta_description: input.meta_description,
            status: input.status,
            published_at: input.published_at,
            scheduled_at: input.scheduled_at,
            created_at: input.now,
            updated_at: input.now,
        };
        state.posts.insert(id, post.clone());
        state.tags.insert(id, input.tag_ids);
        state.categories.insert(id, input.category_ids);
        Self::snapshot(&mut state, id, input.author_id, input.now);
        Ok(post)
    }

    async fn apply_update(
        &self,
        id: Uuid,
        update: PostUpdate,
        now: DateTime<Utc>,
    ) -> Result<Post, RepoError> {
        let mut state = self.state.lock().unwrap();
        if !state.posts.contains_key(&id) {
            return Err(RepoError::NotFound);
        }

        if let Some(created_by) = update.snapshot_by {
            Self::snapshot(&mut state, id, created_by, now);
        }

        let new_slug = if update.regenerate_slug {
            update
                .title
                .as_deref()
                .map(|t| Self::unique_slug(&state, t, Some(id)))
        } else {
            None
        };

        let post = state.posts.get_mut(&id).expect("checked above");
        if let Some(title) = update.title {
            post.title = title;
        }
        if let Some(slug) = new_slug {
            post.slug = slug;
        }
        if let Some(content) = update.content {
            post.content = content;
        }
        post.excerpt = update.excerpt.apply(post.excerpt.take());
        post.featured_image_url = update
            .featured_image_url
            .apply(post.featured_image_url.take());
        post.meta_title = update.meta_title.apply(post.meta_title.take());
        post.meta_description = update
            .meta_description
            .apply(post.meta_description.take());
        post.updated_at = now;
        let post = post.clone();

        if let Some(tag_ids) = update.tag_ids {
            state.tags.insert(id, tag_ids);
        }
        if let Some(category_ids) = update.category_ids {
            state.categories.insert(id, category_ids);
        }
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut state = self.state.lock().unwrap();
        if state.posts.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        state.versions.retain(|v| v.post_id != id);
        state.views.retain(|v| v.post_id != id);
        state.tags.remove(&id);
        state.categories.remove(&id);
        Ok(())
    }

    async fn mark_published(&self, id: Uuid, now: DateTime<Utc>) -> Result<Post, RepoError> {
        let mut state = self.state.lock().unwrap();
        let post = state.posts.get_mut(&id).ok_or(RepoError::NotFound)?;
        post.status = PostStatus::Published;
        post.published_at = Some(now);
        post.scheduled_at = None;
        post.updated_at = now;
        Ok(post.clone())
    }

    async fn mark_scheduled(
        &self,
        id: Uuid,
        scheduled_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Post, RepoError> {
        let mut state = self.state.lock().unwrap();
        let post = state.posts.get_mut(&id).ok_or(RepoError::NotFound)?;
        post.status = PostStatus::Scheduled;
        post.scheduled_at = Some(scheduled_at);
        post.updated_at = now;
        Ok(post.clone())
    }

    async fn find_due_scheduled(&self, now: DateTime<Utc>) -> Result<Vec<Post>, RepoError> {
        let state = self.state.lock().unwrap();
        let mut due: Vec<Post> = state
            .posts
            .values()
            .filter(|p| p.is_due(now))
            .cloned()
            .collect();
        due.sort_by_key(|p| p.scheduled_at);
        Ok(due)
    }

    async fn publish_if_scheduled(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, RepoError> {
        if *self.fail_publish.lock().unwrap() == Some(id) {
            return Err(RepoError::Query("simulated publish failure".into()));
        }
        let mut state = self.state.lock().unwrap();
        let Some(post) = state.posts.get_mut(&id) else {
            return Ok(false);
        };
        if !post.is_due(now) {
            return Ok(false);
        }
        post.status = PostStatus::Published;
        post.published_at = Some(now);
        post.scheduled_at = None;
        post.updated_at = now;
        Ok(true)
    }
}

#[async_trait]
impl VersionRepository for MemStore {
    async fn list_for_post(
        &self,
        post_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<Page<PostVersion>, RepoError> {
        let state = self.state.lock().unwrap();
        let mut versions: Vec<PostVersion> = state
            .versions
            .iter()
            .filter(|v| v.post_id == post_id)
            .cloned()
            .collect();
        versions.sort_by_key(|v| std::cmp::Reverse(v.version_number));
        let total = versions.len() as u64;
        let items = versions
            .into_iter()
            .skip(((page - 1) * per_page) as usize)
            .take(per_page as usize)
            .collect();
        Ok(Page {
            items,
            page,
            per_page,
            total,
        })
    }

    async fn find_by_number(
        &self,
        post_id: Uuid,
        version_number: i32,
    ) -> Result<Option<PostVersion>, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .versions
            .iter()
            .find(|v| v.post_id == post_id && v.version_number == version_number)
            .cloned())
    }

    async fn append_snapshot(
        &self,
        post_id: Uuid,
        created_by: Uuid,
        now: DateTime<Utc>,
    ) -> Result<PostVersion, RepoError> {
        let mut state = self.state.lock().unwrap();
        if !state.posts.contains_key(&post_id) {
            return Err(RepoError::NotFound);
        }
        MemStore::snapshot(&mut state, post_id, created_by, now);
        Ok(state.versions.last().expect("just pushed").clone())
    }
}

#[async_trait]
impl ViewRepository for MemStore {
    async fn record(&self, view: PostView) -> Result<(), RepoError> {
        self.state.lock().unwrap().views.push(view);
        Ok(())
    }

    async fn count_for_post(&self, post_id: Uuid) -> Result<u64, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state.views.iter().filter(|v| v.post_id == post_id).count() as u64)
    }
}

#[async_trait]
impl SettingsRepository for MemStore {
    async fn get_or_create(&self, now: DateTime<Utc>) -> Result<BlogSettings, RepoError> {
        let mut state = self.state.lock().unwrap();
        Ok(state
            .settings
            .get_or_insert_with(|| BlogSettings {
                updated_at: now,
                ..BlogSettings::default()
            })
            .clone())
    }

    async fn upsert(&self, settings: BlogSettings) -> Result<BlogSettings, RepoError> {
        let mut state = self.state.lock().unwrap();
        state.settings = Some(settings.clone());
        Ok(settings)
    }
}

struct FakeTagValidator {
    reject: Mutex<Option<TagValidationError>>,
}

impl FakeTagValidator {
    fn accepting() -> Self {
        Self {
            reject: Mutex::new(None),
        }
    }

    fn set_failure(&self, err: TagValidationError) {
        *self.reject.lock().unwrap() = Some(err);
    }
}

#[async_trait]
impl TagValidator for FakeTagValidator {
    async fn validate(&self, _tag_ids: &[Uuid]) -> Result<(), TagValidationError> {
        match &*self.reject.lock().unwrap() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    fn advance(&self, d: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += d;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

struct Harness {
    service: PostService,
    store: Arc<MemStore>,
    clock: Arc<ManualClock>,
    tags: Arc<FakeTagValidator>,
}

fn harness() -> Harness {
    harness_with_policy(CreationPolicy::default())
}

fn harness_with_policy(policy: CreationPolicy) -> Harness {
    let store = Arc::new(MemStore::default());
    let clock = Arc::new(ManualClock::at(Utc::now()));
    let tags = Arc::new(FakeTagValidator::accepting());
    let service = PostService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        tags.clone(),
        clock.clone(),
        policy,
    );
    Harness {
        service,
        store,
        clock,
        tags,
    }
}

fn author() -> Actor {
    Actor::new(Uuid::new_v4(), Role::Author)
}

fn new_post(title: &str, content: &str) -> NewPost {
    NewPost {
        title: title.to_string(),
        content: content.to_string(),
        ..NewPost::default()
    }
}

async fn create(h: &Harness, actor: &Actor, title: &str) -> Post {
    h.service
        .create_post(Some(actor), new_post(title, "initial content"))
        .await
        .expect("create post")
}

#[tokio::test]
async fn creating_a_post_records_version_one_with_initial_content() {
    let h = harness();
    let actor = author();
    let post = create(&h, &actor, "First Post").await;

    assert_eq!(post.status, PostStatus::Draft);
    let versions = h
        .service
        .list_versions(&actor, post.id, 1, 10)
        .await
        .unwrap();
    assert_eq!(versions.total, 1);
    assert_eq!(versions.items[0].version_number, 1);
    assert_eq!(versions.items[0].content, "initial content");
    assert_eq!(versions.items[0].title, "First Post");
}

#[tokio::test]
async fn identical_titles_get_suffixed_slugs() {
    let h = harness();
    let actor = author();
    let a = create(&h, &actor, "Hello World").await;
    let b = create(&h, &actor, "Hello World").await;
    let c = create(&h, &actor, "Hello World").await;

    assert_eq!(a.slug, "hello-world");
    assert_eq!(b.slug, "hello-world-1");
    assert_eq!(c.slug, "hello-world-2");
}

#[tokio::test]
async fn punctuation_only_title_still_gets_a_slug() {
    let h = harness();
    let actor = author();
    let post = create(&h, &actor, "!!!").await;
    assert_eq!(post.slug, "post");
    let second = create(&h, &actor, "???").await;
    assert_eq!(second.slug, "post-1");
}

#[tokio::test]
async fn unknown_status_defaults_to_draft_on_create() {
    let h = harness();
    let actor = author();
    let mut input = new_post("Weird", "content");
    input.status = Some("banana".to_string());
    let post = h.service.create_post(Some(&actor), input).await.unwrap();
    assert_eq!(post.status, PostStatus::Draft);
    assert!(post.published_at.is_none());
}

#[tokio::test]
async fn create_as_published_sets_published_at() {
    let h = harness();
    let actor = author();
    let mut input = new_post("Live", "content");
    input.status = Some("published".to_string());
    let post = h.service.create_post(Some(&actor), input).await.unwrap();
    assert_eq!(post.status, PostStatus::Published);
    assert_eq!(post.published_at, Some(h.clock.now()));
}

#[tokio::test]
async fn create_as_scheduled_requires_future_time() {
    let h = harness();
    let actor = author();

    let mut input = new_post("Later", "content");
    input.status = Some("scheduled".to_string());
    let err = h
        .service
        .create_post(Some(&actor), input.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    input.scheduled_at = Some(h.clock.now() - Duration::minutes(1));
    let err = h
        .service
        .create_post(Some(&actor), input.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    input.scheduled_at = Some(h.clock.now() + Duration::hours(1));
    let post = h.service.create_post(Some(&actor), input).await.unwrap();
    assert_eq!(post.status, PostStatus::Scheduled);
}

#[tokio::test]
async fn k_updates_produce_contiguous_versions_of_pre_update_state() {
    let h = harness();
    let actor = author();
    let post = create(&h, &actor, "Evolving").await;

    for i in 0..3 {
        h.service
            .update_post(
                &actor,
                post.id,
                EditPost {
                    content: Some(format!("content v{}", i + 2)),
                    ..EditPost::default()
                },
            )
            .await
            .unwrap();
    }

    let versions = h
        .service
        .list_versions(&actor, post.id, 1, 10)
        .await
        .unwrap();
    assert_eq!(versions.total, 4);
    let mut numbers: Vec<i32> = versions.items.iter().map(|v| v.version_number).collect();
    numbers.sort();
    assert_eq!(numbers, vec![1, 2, 3, 4]);

    // Version i captures the content as it was *before* update i.
    let v2 = h.service.get_version(&actor, post.id, 2).await.unwrap();
    assert_eq!(v2.content, "initial content");
    let v3 = h.service.get_version(&actor, post.id, 3).await.unwrap();
    assert_eq!(v3.content, "content v2");
    let v4 = h.service.get_version(&actor, post.id, 4).await.unwrap();
    assert_eq!(v4.content, "content v3");
}

#[tokio::test]
async fn update_without_snapshot_request_creates_no_version() {
    let h = harness();
    let actor = author();
    let post = create(&h, &actor, "Quiet").await;

    h.service
        .update_post(
            &actor,
            post.id,
            EditPost {
                content: Some("silently changed".to_string()),
                create_version: false,
                ..EditPost::default()
            },
        )
        .await
        .unwrap();

    let versions = h
        .service
        .list_versions(&actor, post.id, 1, 10)
        .await
        .unwrap();
    assert_eq!(versions.total, 1);
}

#[tokio::test]
async fn metadata_only_update_creates_no_version() {
    let h = harness();
    let actor = author();
    let post = create(&h, &actor, "Meta").await;

    h.service
        .update_post(
            &actor,
            post.id,
            EditPost {
                meta_title: Field::Set("seo title".to_string()),
                ..EditPost::default()
            },
        )
        .await
        .unwrap();

    let versions = h
        .service
        .list_versions(&actor, post.id, 1, 10)
        .await
        .unwrap();
    assert_eq!(versions.total, 1);
}

#[tokio::test]
async fn title_change_regenerates_slug_excluding_self() {
    let h = harness();
    let actor = author();
    let post = create(&h, &actor, "Original Title").await;

    let updated = h
        .service
        .update_post(
            &actor,
            post.id,
            EditPost {
                title: Some("Brand New Title".to_string()),
                ..EditPost::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.slug, "brand-new-title");

    // Re-sending the same title must not churn the slug.
    let unchanged = h
        .service
        .update_post(
            &actor,
            post.id,
            EditPost {
                title: Some("Brand New Title".to_string()),
                create_version: false,
                ..EditPost::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(unchanged.slug, "brand-new-title");
}

#[tokio::test]
async fn restore_snapshots_current_state_then_applies_target() {
    let h = harness();
    let actor = author();
    let post = create(&h, &actor, "Restorable").await;

    h.service
        .update_post(
            &actor,
            post.id,
            EditPost {
                content: Some("second draft".to_string()),
                excerpt: Field::Set("an excerpt".to_string()),
                ..EditPost::default()
            },
        )
        .await
        .unwrap();

    let published = h.service.publish_post(&actor, post.id).await.unwrap();

    let restored = h.service.restore_version(&actor, post.id, 1).await.unwrap();
    assert_eq!(restored.content, "initial content");
    assert_eq!(restored.excerpt, None);
    // Restore never touches status, slug, or publication timestamps.
    assert_eq!(restored.status, PostStatus::Published);
    assert_eq!(restored.slug, post.slug);
    assert_eq!(restored.published_at, published.published_at);

    // The pre-restore state became version 3.
    let v3 = h.service.get_version(&actor, post.id, 3).await.unwrap();
    assert_eq!(v3.content, "second draft");
    assert_eq!(v3.excerpt.as_deref(), Some("an excerpt"));
}

#[tokio::test]
async fn restoring_missing_version_is_not_found() {
    let h = harness();
    let actor = author();
    let post = create(&h, &actor, "Sparse").await;
    let err = h
        .service
        .restore_version(&actor, post.id, 42)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { entity: "version", .. }));
}

#[tokio::test]
async fn scheduling_guards_status_and_time() {
    let h = harness();
    let actor = author();
    let post = create(&h, &actor, "Timed").await;
    let now = h.clock.now();

    let err = h
        .service
        .schedule_post(&actor, post.id, now - Duration::minutes(5))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    let at = now + Duration::hours(2);
    let scheduled = h.service.schedule_post(&actor, post.id, at).await.unwrap();
    assert_eq!(scheduled.status, PostStatus::Scheduled);
    assert_eq!(scheduled.scheduled_at, Some(at));

    // No longer a draft, so scheduling again is rejected.
    let err = h
        .service
        .schedule_post(&actor, post.id, at + Duration::hours(1))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[tokio::test]
async fn publish_rejects_already_published() {
    let h = harness();
    let actor = author();
    let post = create(&h, &actor, "Once").await;

    let published = h.service.publish_post(&actor, post.id).await.unwrap();
    assert_eq!(published.status, PostStatus::Published);
    assert!(published.published_at.is_some());

    let err = h.service.publish_post(&actor, post.id).await.unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[tokio::test]
async fn sweep_publishes_only_due_posts() {
    let h = harness();
    let actor = author();
    let now = h.clock.now();

    let a = create(&h, &actor, "Due Post").await;
    h.service
        .schedule_post(&actor, a.id, now + Duration::minutes(5))
        .await
        .unwrap();
    let b = create(&h, &actor, "Future Post").await;
    h.service
        .schedule_post(&actor, b.id, now + Duration::hours(5))
        .await
        .unwrap();
    let c = create(&h, &actor, "Plain Draft").await;

    h.clock.advance(Duration::minutes(10));
    let published = h.service.sweep_publish().await.unwrap();

    assert_eq!(published.len(), 1);
    assert_eq!(published[0].id, a.id);
    assert_eq!(published[0].title, "Due Post");

    let a_after = h.store.find_by_id(a.id).await.unwrap().unwrap();
    assert_eq!(a_after.status, PostStatus::Published);
    assert_eq!(a_after.scheduled_at, None);
    let b_after = h.store.find_by_id(b.id).await.unwrap().unwrap();
    assert_eq!(b_after.status, PostStatus::Scheduled);
    let c_after = h.store.find_by_id(c.id).await.unwrap().unwrap();
    assert_eq!(c_after.status, PostStatus::Draft);
}

#[tokio::test]
async fn sweep_is_idempotent() {
    let h = harness();
    let actor = author();
    let post = create(&h, &actor, "Repeat").await;
    h.service
        .schedule_post(&actor, post.id, h.clock.now() + Duration::minutes(1))
        .await
        .unwrap();

    h.clock.advance(Duration::minutes(2));
    let first = h.service.sweep_publish().await.unwrap();
    assert_eq!(first.len(), 1);

    let second = h.service.sweep_publish().await.unwrap();
    assert!(second.is_empty());
}

#[tokio::test]
async fn sweep_skips_failing_post_and_publishes_the_rest() {
    let h = harness();
    let actor = author();
    let now = h.clock.now();

    let poison = create(&h, &actor, "Poison").await;
    h.service
        .schedule_post(&actor, poison.id, now + Duration::minutes(1))
        .await
        .unwrap();
    let healthy = create(&h, &actor, "Healthy").await;
    h.service
        .schedule_post(&actor, healthy.id, now + Duration::minutes(2))
        .await
        .unwrap();

    *h.store.fail_publish.lock().unwrap() = Some(poison.id);
    h.clock.advance(Duration::minutes(5));

    let published = h.service.sweep_publish().await.unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].id, healthy.id);

    let poison_after = h.store.find_by_id(poison.id).await.unwrap().unwrap();
    assert_eq!(poison_after.status, PostStatus::Scheduled);
}

#[tokio::test]
async fn non_author_without_privilege_is_rejected_everywhere() {
    let h = harness();
    let owner = author();
    let stranger = Actor::new(Uuid::new_v4(), Role::Author);
    let reader = Actor::new(Uuid::new_v4(), Role::Reader);
    let post = create(&h, &owner, "Private").await;

    let edit = EditPost {
        content: Some("hijacked".to_string()),
        ..EditPost::default()
    };
    for actor in [&stranger, &reader] {
        assert!(matches!(
            h.service.update_post(actor, post.id, edit.clone()).await,
            Err(DomainError::Forbidden)
        ));
        assert!(matches!(
            h.service.delete_post(actor, post.id).await,
            Err(DomainError::Forbidden)
        ));
        assert!(matches!(
            h.service.publish_post(actor, post.id).await,
            Err(DomainError::Forbidden)
        ));
        assert!(matches!(
            h.service
                .schedule_post(actor, post.id, h.clock.now() + Duration::hours(1))
                .await,
            Err(DomainError::Forbidden)
        ));
        assert!(matches!(
            h.service.list_versions(actor, post.id, 1, 10).await,
            Err(DomainError::Forbidden)
        ));
    }

    // No state change leaked through.
    let after = h.store.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(after.content, "initial content");
    assert_eq!(after.status, PostStatus::Draft);

    // An editor, however, may edit someone else's post.
    let editor = Actor::new(Uuid::new_v4(), Role::Editor);
    let updated = h.service.update_post(&editor, post.id, edit).await.unwrap();
    assert_eq!(updated.content, "hijacked");
}

#[tokio::test]
async fn failed_tag_validation_rejects_the_whole_update() {
    let h = harness();
    let actor = author();
    let tag = Uuid::new_v4();
    let mut input = new_post("Tagged", "content");
    input.tag_ids = vec![tag];
    let post = h.service.create_post(Some(&actor), input).await.unwrap();

    let bad_tag = Uuid::new_v4();
    h.tags.set_failure(TagValidationError::NotFound(bad_tag));

    let err = h
        .service
        .update_post(
            &actor,
            post.id,
            EditPost {
                title: Some("Renamed".to_string()),
                tag_ids: Some(vec![tag, bad_tag]),
                ..EditPost::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::TagValidation(_)));

    // Neither the tag set nor the other fields changed.
    let after = h.service.get_post(Some(&actor), post.id).await;
    let after = match after {
        Ok(full) => full,
        Err(_) => panic!("post should still be readable by its author"),
    };
    assert_eq!(after.post.title, "Tagged");
    assert_eq!(after.tag_ids, vec![tag]);
}

#[tokio::test]
async fn unreachable_tag_service_rejects_create() {
    let h = harness();
    let actor = author();
    h.tags
        .set_failure(TagValidationError::Unreachable("connection refused".into()));

    let mut input = new_post("Unlucky", "content");
    input.tag_ids = vec![Uuid::new_v4()];
    let err = h.service.create_post(Some(&actor), input).await.unwrap_err();
    assert!(matches!(err, DomainError::TagValidation(_)));
    assert!(h.store.state.lock().unwrap().posts.is_empty());
}

#[tokio::test]
async fn n_recorded_views_read_back_as_n() {
    let h = harness();
    let actor = author();
    let post = create(&h, &actor, "Popular").await;

    for _ in 0..5 {
        // Same IP and agent every time: duplicates all count.
        h.service
            .record_view(post.id, Some("10.0.0.1".into()), Some("curl/8".into()))
            .await
            .unwrap();
    }
    assert_eq!(h.service.view_count(post.id).await.unwrap(), 5);
}

#[tokio::test]
async fn draft_deletion_path_rejects_published_posts() {
    let h = harness();
    let actor = author();
    let post = create(&h, &actor, "Ephemeral").await;
    h.service.publish_post(&actor, post.id).await.unwrap();

    let err = h.service.delete_draft(&actor, post.id).await.unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    // The generic delete still works and cascades.
    h.service
        .record_view(post.id, None, None)
        .await
        .unwrap();
    h.service.delete_post(&actor, post.id).await.unwrap();
    let state = h.store.state.lock().unwrap();
    assert!(state.posts.is_empty());
    assert!(state.versions.is_empty());
    assert!(state.views.is_empty());
}

#[tokio::test]
async fn unauthenticated_creation_is_disabled_by_default() {
    let h = harness();
    let err = h
        .service
        .create_post(None, new_post("Anon", "content"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden));
}

#[tokio::test]
async fn permissive_mode_attributes_posts_to_fallback_author() {
    let fallback = Uuid::new_v4();
    let h = harness_with_policy(CreationPolicy {
        allow_unauthenticated: true,
        fallback_author: fallback,
    });
    let post = h
        .service
        .create_post(None, new_post("Anon", "content"))
        .await
        .unwrap();
    assert_eq!(post.author_id, fallback);
}

#[tokio::test]
async fn drafts_are_hidden_from_the_public() {
    let h = harness();
    let actor = author();
    let post = create(&h, &actor, "Hidden").await;

    assert!(matches!(
        h.service.get_post(None, post.id).await,
        Err(DomainError::Forbidden)
    ));
    assert!(h.service.get_post(Some(&actor), post.id).await.is_ok());

    h.service.publish_post(&actor, post.id).await.unwrap();
    assert!(h.service.get_post(None, post.id).await.is_ok());
}

#[tokio::test]
async fn listing_defaults_to_published_and_scopes_drafts() {
    let h = harness();
    let alice = author();
    let bob = author();
    let a = create(&h, &alice, "Alice Draft").await;
    let b = create(&h, &bob, "Bob Draft").await;
    h.service.publish_post(&alice, a.id).await.unwrap();

    // Anonymous default: published only.
    let page = h
        .service
        .list_posts(None, PostQuery::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, a.id);

    // Asking for drafts anonymously is refused.
    let draft_query = PostQuery {
        status: Some(PostStatus::Draft),
        ..PostQuery::default()
    };
    assert!(matches!(
        h.service.list_posts(None, draft_query.clone()).await,
        Err(DomainError::Forbidden)
    ));

    // A plain author only sees their own drafts.
    let page = h
        .service
        .list_posts(Some(&bob), draft_query.clone())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, b.id);

    // An editor sees everyone's.
    let editor = Actor::new(Uuid::new_v4(), Role::Editor);
    let page = h
        .service
        .list_posts(Some(&editor), draft_query)
        .await
        .unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn settings_materialize_defaults_then_upsert() {
    let store = Arc::new(MemStore::default());
    let clock = Arc::new(ManualClock::at(Utc::now()));
    let service = SettingsService::new(store.clone(), clock.clone());

    let settings = service.get().await.unwrap();
    assert_eq!(settings.blog_title, "My Blog");
    assert_eq!(settings.posts_per_page, 10);

    let admin = Actor::new(Uuid::new_v4(), Role::Admin);
    let updated = service
        .update(
            &admin,
            UpdateSettings {
                blog_title: "Quill Weekly".to_string(),
                blog_tagline: Some("words, weekly".to_string()),
                blog_description: None,
                posts_per_page: 25,
                allow_comments: false,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.blog_title, "Quill Weekly");
    assert_eq!(updated.updated_by, Some(admin.id));

    let round_trip = service.get().await.unwrap();
    assert_eq!(round_trip.blog_title, "Quill Weekly");
    assert_eq!(round_trip.posts_per_page, 25);
}

#[tokio::test]
async fn settings_update_requires_privileged_role() {
    let store = Arc::new(MemStore::default());
    let clock = Arc::new(ManualClock::at(Utc::now()));
    let service = SettingsService::new(store, clock);

    let nobody = Actor::new(Uuid::new_v4(), Role::Author);
    let err = service
        .update(
            &nobody,
            UpdateSettings {
                blog_title: "Hostile Takeover".to_string(),
                blog_tagline: None,
                blog_description: None,
                posts_per_page: 10,
                allow_comments: true,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden));
}
