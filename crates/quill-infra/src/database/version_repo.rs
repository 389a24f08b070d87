//! PostgreSQL version store. Append and read only; deletes happen solely
//! through the post's cascade.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbConn, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use uuid::Uuid;

use quill_core::domain::PostVersion;
use quill_core::error::RepoError;
use quill_core::ports::{Page, VersionRepository};

use super::entity::{post, post_version};
use super::post_repo::next_version_number;
use super::{CONSTRAINT_RETRY_LIMIT, map_db_err};

/// PostgreSQL version repository.
pub struct PostgresVersionRepository {
    db: DbConn,
}

impl PostgresVersionRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    async fn try_append_snapshot(
        &self,
        post_id: Uuid,
        created_by: Uuid,
        now: DateTime<Utc>,
    ) -> Result<PostVersion, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let current = post::Entity::find_by_id(post_id)
            .one(&txn)
            .await
            .map_err(map_db_err)?
            .ok_or(RepoError::NotFound)?;

        let next = next_version_number(&txn, post_id).await?;
        let inserted = post_version::ActiveModel {
            id: Set(Uuid::new_v4()),
            post_id: Set(post_id),
            version_number: Set(next),
            title: Set(current.title),
            content: Set(current.content),
            excerpt: Set(current.excerpt),
            created_by: Set(created_by),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await
        .map_err(map_db_err)?;

        txn.commit().await.map_err(map_db_err)?;
        Ok(inserted.into())
    }
}

#[async_trait]
impl VersionRepository for PostgresVersionRepository {
    async fn list_for_post(
        &self,
        post_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<Page<PostVersion>, RepoError> {
        let paginator = post_version::Entity::find()
            .filter(post_version::Column::PostId.eq(post_id))
            .order_by_desc(post_version::Column::VersionNumber)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await.map_err(map_db_err)?;
        let models = paginator.fetch_page(page - 1).await.map_err(map_db_err)?;

        Ok(Page {
            items: models.into_iter().map(Into::into).collect(),
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
        let result = post_version::Entity::find()
            .filter(post_version::Column::PostId.eq(post_id))
            .filter(post_version::Column::VersionNumber.eq(version_number))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(result.map(Into::into))
    }

    async fn append_snapshot(
        &self,
        post_id: Uuid,
        created_by: Uuid,
        now: DateTime<Utc>,
    ) -> Result<PostVersion, RepoError> {
        // A concurrent writer can claim the same version number; the
        // unique (post_id, version_number) index rejects the loser, who
        // re-reads and retries on a fresh transaction.
        let mut last = RepoError::Constraint("snapshot retries exhausted".to_string());
        for attempt in 0..CONSTRAINT_RETRY_LIMIT {
            match self.try_append_snapshot(post_id, created_by, now).await {
                Err(RepoError::Constraint(msg)) => {
                    tracing::warn!(attempt, post_id = %post_id, error = %msg, "Duplicate version number on snapshot, retrying");
                    last = RepoError::Constraint(msg);
                }
                other => return other,
            }
        }
        Err(last)
    }
}
