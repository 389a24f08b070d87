//! PostgreSQL post repository.
//!
//! Every multi-step write runs in one transaction; a dropped transaction
//! rolls back, so partial application is never observable. Duplicate-key
//! failures (slug or version-number races) are retried as fresh
//! transactions a bounded number of times - Postgres aborts a transaction
//! on constraint violation, so an in-transaction retry is not possible.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, Condition, DbConn, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use quill_core::domain::{Field, Post, PostStatus, PostUpdate, PostWithRelations};
use quill_core::error::RepoError;
use quill_core::ports::{
    CreatePost, Page, PostQuery, PostRepository, PostSort, SortDirection,
};

use super::entity::{post, post_category, post_tag, post_version, post_view};
use super::{CONSTRAINT_RETRY_LIMIT, map_db_err, slug};

/// PostgreSQL post repository.
pub struct PostgresPostRepository {
    db: DbConn,
}

impl PostgresPostRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    async fn try_create(&self, input: &CreatePost) -> Result<Post, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let slug = slug::generate(&txn, &input.title, None)
            .await
            .map_err(map_db_err)?;
        let post_id = Uuid::new_v4();

        let inserted = post::ActiveModel {
            id: Set(post_id),
            author_id: Set(input.author_id),
            title: Set(input.title.clone()),
            slug: Set(slug),
            content: Set(input.content.clone()),
            excerpt: Set(input.excerpt.clone()),
            featured_image_url: Set(input.featured_image_url.clone()),
            meta_title: Set(input.meta_title.clone()),
            meta_description: Set(input.meta_description.clone()),
            status: Set(input.status.as_str().to_string()),
            published_at: Set(input.published_at.map(Into::into)),
            scheduled_at: Set(input.scheduled_at.map(Into::into)),
            created_at: Set(input.now.into()),
            updated_at: Set(input.now.into()),
        }
        .insert(&txn)
        .await
        .map_err(map_db_err)?;

        // Version 1 mirrors the initial content.
        post_version::ActiveModel {
            id: Set(Uuid::new_v4()),
            post_id: Set(post_id),
            version_number: Set(1),
            title: Set(input.title.clone()),
            content: Set(input.content.clone()),
            excerpt: Set(input.excerpt.clone()),
            created_by: Set(input.author_id),
            created_at: Set(input.now.into()),
        }
        .insert(&txn)
        .await
        .map_err(map_db_err)?;

        insert_tag_links(&txn, post_id, &input.tag_ids).await?;
        insert_category_links(&txn, post_id, &input.category_ids).await?;

        txn.commit().await.map_err(map_db_err)?;
        Ok(inserted.into())
    }

    async fn try_apply_update(
        &self,
        id: Uuid,
        update: &PostUpdate,
        now: DateTime<Utc>,
    ) -> Result<Post, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let current = post::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(map_db_err)?
            .ok_or(RepoError::NotFound)?;

        // Snapshot the pre-write state before anything is overwritten.
        if let Some(created_by) = update.snapshot_by {
            let next = next_version_number(&txn, id).await?;
            post_version::ActiveModel {
                id: Set(Uuid::new_v4()),
                post_id: Set(id),
                version_number: Set(next),
                title: Set(current.title.clone()),
                content: Set(current.content.clone()),
                excerpt: Set(current.excerpt.clone()),
                created_by: Set(created_by),
                created_at: Set(now.into()),
            }
            .insert(&txn)
            .await
            .map_err(map_db_err)?;
        }

        let mut active = current.into_active_model();
        if let Some(title) = &update.title {
            active.title = Set(title.clone());
            if update.regenerate_slug {
                let slug = slug::generate(&txn, title, Some(id))
                    .await
                    .map_err(map_db_err)?;
                active.slug = Set(slug);
            }
        }
        if let Some(content) = &update.content {
            active.content = Set(content.clone());
        }
        apply_field(&mut active.excerpt, &update.excerpt);
        apply_field(&mut active.featured_image_url, &update.featured_image_url);
        apply_field(&mut active.meta_title, &update.meta_title);
        apply_field(&mut active.meta_description, &update.meta_description);
        active.updated_at = Set(now.into());

        let updated = active.update(&txn).await.map_err(map_db_err)?;

        if let Some(tag_ids) = &update.tag_ids {
            post_tag::Entity::delete_many()
                .filter(post_tag::Column::PostId.eq(id))
                .exec(&txn)
                .await
                .map_err(map_db_err)?;
            insert_tag_links(&txn, id, tag_ids).await?;
        }
        if let Some(category_ids) = &update.category_ids {
            post_category::Entity::delete_many()
                .filter(post_category::Column::PostId.eq(id))
                .exec(&txn)
                .await
                .map_err(map_db_err)?;
            insert_category_links(&txn, id, category_ids).await?;
        }

        txn.commit().await.map_err(map_db_err)?;
        Ok(updated.into())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let result = post::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(result.map(Into::into))
    }

    async fn find_with_relations(
        &self,
        id: Uuid,
    ) -> Result<Option<PostWithRelations>, RepoError> {
        let Some(model) = post::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_err)?
        else {
            return Ok(None);
        };

        let tag_ids = post_tag::Entity::find()
            .filter(post_tag::Column::PostId.eq(id))
            .all(&self.db)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(|m| m.tag_id)
            .collect();
        let category_ids = post_category::Entity::find()
            .filter(post_category::Column::PostId.eq(id))
            .all(&self.db)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(|m| m.category_id)
            .collect();
        let view_count = post_view::Entity::find()
            .filter(post_view::Column::PostId.eq(id))
            .count(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(Some(PostWithRelations {
            post: model.into(),
            category_ids,
            tag_ids,
            view_count,
        }))
    }

    async fn list(&self, query: &PostQuery) -> Result<Page<Post>, RepoError> {
        let mut select = post::Entity::find();

        if let Some(status) = query.status {
            select = select.filter(post::Column::Status.eq(status.as_str()));
        }
        if let Some(author_id) = query.author_id {
            select = select.filter(post::Column::AuthorId.eq(author_id));
        }
        if let Some(tag_id) = query.tag_id {
            let ids: Vec<Uuid> = post_tag::Entity::find()
                .filter(post_tag::Column::TagId.eq(tag_id))
                .all(&self.db)
                .await
                .map_err(map_db_err)?
                .into_iter()
                .map(|m| m.post_id)
                .collect();
            if ids.is_empty() {
                return Ok(empty_page(query));
            }
            select = select.filter(post::Column::Id.is_in(ids));
        }
        if let Some(category_id) = query.category_id {
            let ids: Vec<Uuid> = post_category::Entity::find()
                .filter(post_category::Column::CategoryId.eq(category_id))
                .all(&self.db)
                .await
                .map_err(map_db_err)?
                .into_iter()
                .map(|m| m.post_id)
                .collect();
            if ids.is_empty() {
                return Ok(empty_page(query));
            }
            select = select.filter(post::Column::Id.is_in(ids));
        }
        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            select = select.filter(
                Condition::any()
                    .add(post::Column::Title.contains(search))
                    .add(post::Column::Content.contains(search))
                    .add(post::Column::Excerpt.contains(search))
                    .add(post::Column::MetaTitle.contains(search))
                    .add(post::Column::MetaDescription.contains(search)),
            );
        }

        let column = match query.sort {
            PostSort::CreatedAt => post::Column::CreatedAt,
            PostSort::UpdatedAt => post::Column::UpdatedAt,
            PostSort::PublishedAt => post::Column::PublishedAt,
            PostSort::ScheduledAt => post::Column::ScheduledAt,
            PostSort::Title => post::Column::Title,
        };
        select = match query.direction {
            SortDirection::Asc => select.order_by_asc(column),
            SortDirection::Desc => select.order_by_desc(column),
        };

        let paginator = select.paginate(&self.db, query.per_page);
        let total = paginator.num_items().await.map_err(map_db_err)?;
        let models = paginator
            .fetch_page(query.page - 1)
            .await
            .map_err(map_db_err)?;

        Ok(Page {
            items: models.into_iter().map(Into::into).collect(),
            page: query.page,
            per_page: query.per_page,
            total,
        })
    }

    async fn create(&self, input: CreatePost) -> Result<Post, RepoError> {
        let mut last = RepoError::Constraint("slug collision retries exhausted".to_string());
        for attempt in 0..CONSTRAINT_RETRY_LIMIT {
            match self.try_create(&input).await {
                Err(RepoError::Constraint(msg)) => {
                    tracing::warn!(attempt, error = %msg, "Duplicate key on post create, re-probing");
                    last = RepoError::Constraint(msg);
                }
                other => return other,
            }
        }
        Err(last)
    }

    async fn apply_update(
        &self,
        id: Uuid,
        update: PostUpdate,
        now: DateTime<Utc>,
    ) -> Result<Post, RepoError> {
        let mut last = RepoError::Constraint("update retries exhausted".to_string());
        for attempt in 0..CONSTRAINT_RETRY_LIMIT {
            match self.try_apply_update(id, &update, now).await {
                Err(RepoError::Constraint(msg)) => {
                    tracing::warn!(attempt, post_id = %id, error = %msg, "Duplicate key on post update, retrying");
                    last = RepoError::Constraint(msg);
                }
                other => return other,
            }
        }
        Err(last)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        // Versions, links, and views go via ON DELETE CASCADE.
        let result = post::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;
        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn mark_published(&self, id: Uuid, now: DateTime<Utc>) -> Result<Post, RepoError> {
        let model = post::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .ok_or(RepoError::NotFound)?;

        let mut active = model.into_active_model();
        active.status = Set(PostStatus::Published.as_str().to_string());
        active.published_at = Set(Some(now.into()));
        active.scheduled_at = Set(None);
        active.updated_at = Set(now.into());

        let updated = active.update(&self.db).await.map_err(map_db_err)?;
        Ok(updated.into())
    }

    async fn mark_scheduled(
        &self,
        id: Uuid,
        scheduled_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Post, RepoError> {
        let model = post::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .ok_or(RepoError::NotFound)?;

        let mut active = model.into_active_model();
        active.status = Set(PostStatus::Scheduled.as_str().to_string());
        active.scheduled_at = Set(Some(scheduled_at.into()));
        active.updated_at = Set(now.into());

        let updated = active.update(&self.db).await.map_err(map_db_err)?;
        Ok(updated.into())
    }

    async fn find_due_scheduled(&self, now: DateTime<Utc>) -> Result<Vec<Post>, RepoError> {
        let models = post::Entity::find()
            .filter(post::Column::Status.eq(PostStatus::Scheduled.as_str()))
            .filter(post::Column::ScheduledAt.lte(now))
            .order_by_asc(post::Column::ScheduledAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn publish_if_scheduled(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, RepoError> {
        // Conditional single-row update: a racing sweep that already
        // published this post makes this affect zero rows, which is a
        // skip, not an error.
        let result = post::Entity::update_many()
            .col_expr(
                post::Column::Status,
                Expr::value(PostStatus::Published.as_str()),
            )
            .col_expr(post::Column::PublishedAt, Expr::value(Some(to_tz(now))))
            .col_expr(
                post::Column::ScheduledAt,
                Expr::value(none_tz()),
            )
            .col_expr(post::Column::UpdatedAt, Expr::value(to_tz(now)))
            .filter(post::Column::Id.eq(id))
            .filter(post::Column::Status.eq(PostStatus::Scheduled.as_str()))
            .filter(post::Column::ScheduledAt.lte(now))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected > 0)
    }
}

fn to_tz(t: DateTime<Utc>) -> sea_orm::prelude::DateTimeWithTimeZone {
    t.into()
}

fn none_tz() -> Option<sea_orm::prelude::DateTimeWithTimeZone> {
    None
}

fn empty_page(query: &PostQuery) -> Page<Post> {
    Page {
        items: Vec::new(),
        page: query.page,
        per_page: query.per_page,
        total: 0,
    }
}

fn apply_field(slot: &mut ActiveValue<Option<String>>, field: &Field<String>) {
    match field {
        Field::Keep => {}
        Field::Set(value) => *slot = Set(Some(value.clone())),
        Field::Clear => *slot = Set(None),
    }
}

/// Next contiguous version number for a post, read on the write
/// transaction so concurrent writers collide on the unique constraint
/// instead of silently reusing a number.
pub(crate) async fn next_version_number<C: sea_orm::ConnectionTrait>(
    conn: &C,
    post_id: Uuid,
) -> Result<i32, RepoError> {
    let latest = post_version::Entity::find()
        .filter(post_version::Column::PostId.eq(post_id))
        .order_by_desc(post_version::Column::VersionNumber)
        .one(conn)
        .await
        .map_err(map_db_err)?;
    Ok(latest.map(|v| v.version_number).unwrap_or(0) + 1)
}

async fn insert_tag_links<C: sea_orm::ConnectionTrait>(
    conn: &C,
    post_id: Uuid,
    tag_ids: &[Uuid],
) -> Result<(), RepoError> {
    if tag_ids.is_empty() {
        return Ok(());
    }
    let rows = tag_ids.iter().map(|tag_id| post_tag::ActiveModel {
        post_id: Set(post_id),
        tag_id: Set(*tag_id),
    });
    post_tag::Entity::insert_many(rows)
        .exec(conn)
        .await
        .map_err(map_db_err)?;
    Ok(())
}

async fn insert_category_links<C: sea_orm::ConnectionTrait>(
    conn: &C,
    post_id: Uuid,
    category_ids: &[Uuid],
) -> Result<(), RepoError> {
    if category_ids.is_empty() {
        return Ok(());
    }
    let rows = category_ids
        .iter()
        .map(|category_id| post_category::ActiveModel {
            post_id: Set(post_id),
            category_id: Set(*category_id),
        });
    post_category::Entity::insert_many(rows)
        .exec(conn)
        .await
        .map_err(map_db_err)?;
    Ok(())
}
