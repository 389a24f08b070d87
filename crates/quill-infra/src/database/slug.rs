//! Slug uniqueness probing.
//!
//! The probe runs on the caller's transaction so create/update see a
//! consistent view; the posts table's unique constraint stays the final
//! authority, and a duplicate-key failure on commit is retried by the
//! repository as a fresh transaction.

use quill_core::slug::{candidate, slugify};
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};
use uuid::Uuid;

use super::entity::post;

/// Generate a collision-free slug for a title.
///
/// On the update path `exclude` carries the post's own id so its current
/// slug does not count as a collision.
pub(crate) async fn generate<C: ConnectionTrait>(
    conn: &C,
    title: &str,
    exclude: Option<Uuid>,
) -> Result<String, DbErr> {
    let base = slugify(title);
    let mut n = 0;
    loop {
        let slug = candidate(&base, n);
        let mut query = post::Entity::find().filter(post::Column::Slug.eq(slug.as_str()));
        if let Some(id) = exclude {
            query = query.filter(post::Column::Id.ne(id));
        }
        if query.one(conn).await?.is_none() {
            return Ok(slug);
        }
        n += 1;
    }
}
