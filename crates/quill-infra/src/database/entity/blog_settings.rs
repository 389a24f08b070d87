//! Singleton blog settings entity (exactly one row, fixed id).

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use quill_core::domain::BlogSettings;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "blog_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub blog_title: String,
    pub blog_tagline: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub blog_description: Option<String>,
    pub posts_per_page: i32,
    pub allow_comments: bool,
    pub updated_by: Option<Uuid>,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for BlogSettings {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            blog_title: model.blog_title,
            blog_tagline: model.blog_tagline,
            blog_description: model.blog_description,
            posts_per_page: model.posts_per_page,
            allow_comments: model.allow_comments,
            updated_by: model.updated_by,
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<BlogSettings> for ActiveModel {
    fn from(settings: BlogSettings) -> Self {
        Self {
            id: Set(settings.id),
            blog_title: Set(settings.blog_title),
            blog_tagline: Set(settings.blog_tagline),
            blog_description: Set(settings.blog_description),
            posts_per_page: Set(settings.posts_per_page),
            allow_comments: Set(settings.allow_comments),
            updated_by: Set(settings.updated_by),
            updated_at: Set(settings.updated_at.into()),
        }
    }
}
