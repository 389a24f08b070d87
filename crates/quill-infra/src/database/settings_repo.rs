//! PostgreSQL singleton settings store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{DbConn, EntityTrait};

use quill_core::domain::{BlogSettings, SETTINGS_ID};
use quill_core::error::RepoError;
use quill_core::ports::SettingsRepository;

use super::entity::blog_settings;
use super::map_db_err;

/// PostgreSQL settings repository.
pub struct PostgresSettingsRepository {
    db: DbConn,
}

impl PostgresSettingsRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SettingsRepository for PostgresSettingsRepository {
    async fn get_or_create(&self, now: DateTime<Utc>) -> Result<BlogSettings, RepoError> {
        if let Some(model) = blog_settings::Entity::find_by_id(SETTINGS_ID)
            .one(&self.db)
            .await
            .map_err(map_db_err)?
        {
            return Ok(model.into());
        }

        // First access: materialize the defaults. A concurrent first
        // access may win the insert; fall back to reading its row.
        let defaults = BlogSettings {
            updated_at: now,
            ..BlogSettings::default()
        };
        match blog_settings::Entity::insert(blog_settings::ActiveModel::from(defaults.clone()))
            .exec(&self.db)
            .await
        {
            Ok(_) => Ok(defaults),
            Err(e) => match map_db_err(e) {
                RepoError::Constraint(_) => {
                    let model = blog_settings::Entity::find_by_id(SETTINGS_ID)
                        .one(&self.db)
                        .await
                        .map_err(map_db_err)?
                        .ok_or(RepoError::NotFound)?;
                    Ok(model.into())
                }
                other => Err(other),
            },
        }
    }

    async fn upsert(&self, settings: BlogSettings) -> Result<BlogSettings, RepoError> {
        let model = blog_settings::Entity::insert(blog_settings::ActiveModel::from(settings))
            .on_conflict(
                OnConflict::column(blog_settings::Column::Id)
                    .update_columns([
                        blog_settings::Column::BlogTitle,
                        blog_settings::Column::BlogTagline,
                        blog_settings::Column::BlogDescription,
                        blog_settings::Column::PostsPerPage,
                        blog_settings::Column::AllowComments,
                        blog_settings::Column::UpdatedBy,
                        blog_settings::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_with_returning(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(model.into())
    }
}
