//! Post version snapshot entity. Append-only: rows are never updated
//! and only disappear when the owning post is deleted.

use sea_orm::entity::prelude::*;

use quill_core::domain::PostVersion;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "post_versions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub post_id: Uuid,
    pub version_number: i32,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub excerpt: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::post::Entity",
        from = "Column::PostId",
        to = "super::post::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Post,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for PostVersion {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            post_id: model.post_id,
            version_number: model.version_number,
            title: model.title,
            content: model.content,
            excerpt: model.excerpt,
            created_by: model.created_by,
            created_at: model.created_at.into(),
        }
    }
}
