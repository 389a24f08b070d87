//! Database connection management and SeaORM repositories.

mod connections;
pub mod entity;
mod post_repo;
mod settings_repo;
mod slug;
mod version_repo;
mod view_repo;

pub use connections::{DatabaseConfig, DatabaseConnections};
pub use post_repo::PostgresPostRepository;
pub use settings_repo::PostgresSettingsRepository;
pub use version_repo::PostgresVersionRepository;
pub use view_repo::PostgresViewRepository;

use quill_core::error::RepoError;
use sea_orm::DbErr;

/// Attempts per write before a duplicate-key race is surfaced. Slug and
/// version-number collisions are retried as fresh transactions up to
/// this bound.
pub(crate) const CONSTRAINT_RETRY_LIMIT: u32 = 5;

/// Map a SeaORM error to the repository error taxonomy. Unique and
/// duplicate-key failures become `Constraint` so callers can retry
/// slug or version-number collisions.
pub(crate) fn map_db_err(e: DbErr) -> RepoError {
    let err_str = e.to_string();
    if err_str.contains("duplicate") || err_str.contains("unique") {
        RepoError::Constraint(err_str)
    } else {
        RepoError::Query(err_str)
    }
}
