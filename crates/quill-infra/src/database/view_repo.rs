//! PostgreSQL view counter: append one row per hit, count on read.

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ColumnTrait, DbConn, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

use quill_core::domain::PostView;
use quill_core::error::RepoError;
use quill_core::ports::ViewRepository;

use super::entity::post_view;
use super::map_db_err;

/// PostgreSQL view repository.
pub struct PostgresViewRepository {
    db: DbConn,
}

impl PostgresViewRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ViewRepository for PostgresViewRepository {
    async fn record(&self, view: PostView) -> Result<(), RepoError> {
        let active: post_view::ActiveModel = view.into();
        active.insert(&self.db).await.map_err(map_db_err)?;
        Ok(())
    }

    async fn count_for_post(&self, post_id: Uuid) -> Result<u64, RepoError> {
        post_view::Entity::find()
            .filter(post_view::Column::PostId.eq(post_id))
            .count(&self.db)
            .await
            .map_err(map_db_err)
    }
}
