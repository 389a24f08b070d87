//! Page view event entity. Append-only; counted, never updated.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use quill_core::domain::PostView;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "post_views")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub post_id: Uuid,
    pub ip_address: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub user_agent: Option<String>,
    pub viewed_at: DateTimeWithTimeZone,
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

impl From<PostView> for ActiveModel {
    fn from(view: PostView) -> Self {
        Self {
            id: Set(view.id),
            post_id: Set(view.post_id),
            ip_address: Set(view.ip_address),
            user_agent: Set(view.user_agent),
            viewed_at: Set(view.viewed_at.into()),
        }
    }
}
