//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::ports::SystemClock;
use quill_core::service::{PostService, SettingsService};
use quill_infra::auth::JwtTokenService;
use quill_infra::database::{
    DatabaseConnections, PostgresPostRepository, PostgresSettingsRepository,
    PostgresVersionRepository, PostgresViewRepository,
};
use quill_infra::tags::HttpTagValidator;

use crate::config::AppConfig;

/// Shared application state.
///
/// Built once at startup from an explicit store handle; a failed
/// database connection aborts the process instead of falling back to a
/// degraded mode.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<PostService>,
    pub settings: Arc<SettingsService>,
    pub tokens: Arc<JwtTokenService>,
    pub db: Arc<DatabaseConnections>,
}

impl AppState {
    /// Build the application state against Postgres.
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let db = Arc::new(DatabaseConnections::init(&config.database).await?);

        let post_repo = Arc::new(PostgresPostRepository::new(db.main.clone()));
        let version_repo = Arc::new(PostgresVersionRepository::new(db.main.clone()));
        let view_repo = Arc::new(PostgresViewRepository::new(db.main.clone()));
        let settings_repo = Arc::new(PostgresSettingsRepository::new(db.main.clone()));

        let tag_validator = Arc::new(HttpTagValidator::new(&config.tag_service)?);
        let clock = Arc::new(SystemClock);

        let posts = Arc::new(PostService::new(
            post_repo,
            version_repo,
            view_repo,
            tag_validator,
            clock.clone(),
            config.creation.clone(),
        ));
        let settings = Arc::new(SettingsService::new(settings_repo, clock));

        let tokens = Arc::new(JwtTokenService::new(&config.jwt_secret));

        tracing::info!("Application state initialized");

        Ok(Self {
            posts,
            settings,
            tokens,
            db,
        })
    }
}
