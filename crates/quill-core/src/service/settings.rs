use std::sync::Arc;

use crate::domain::{Actor, BlogSettings, SETTINGS_ID};
use crate::error::DomainError;
use crate::ports::{Clock, SettingsRepository};

/// Full-replace settings write. Every field is supplied; this is an
/// upsert, not a patch.
#[derive(Debug, Clone)]
pub struct UpdateSettings {
    pub blog_title: String,
    pub blog_tagline: Option<String>,
    pub blog_description: Option<String>,
    pub posts_per_page: i32,
    pub allow_comments: bool,
}

/// Singleton blog settings service.
pub struct SettingsService {
    settings: Arc<dyn SettingsRepository>,
    clock: Arc<dyn Clock>,
}

impl SettingsService {
    pub fn new(settings: Arc<dyn SettingsRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { settings, clock }
    }

    /// Read the settings, materializing defaults on first access.
    pub async fn get(&self) -> Result<BlogSettings, DomainError> {
        Ok(self.settings.get_or_create(self.clock.now()).await?)
    }

    /// Replace the settings row. Requires an editor or admin; the
    /// updating principal is recorded on the row.
    pub async fn update(
        &self,
        actor: &Actor,
        input: UpdateSettings,
    ) -> Result<BlogSettings, DomainError> {
        if !actor.role.is_privileged() {
            return Err(DomainError::Forbidden);
        }
        if input.blog_title.trim().is_empty() {
            return Err(DomainError::validation("blog title must not be empty"));
        }
        if !(1..=100).contains(&input.posts_per_page) {
            return Err(DomainError::validation(
                "posts_per_page must be between 1 and 100",
            ));
        }

        let settings = BlogSettings {
            id: SETTINGS_ID,
            blog_title: input.blog_title,
            blog_tagline: input.blog_tagline,
            blog_description: input.blog_description,
            posts_per_page: input.posts_per_page,
            allow_comments: input.allow_comments,
            updated_by: Some(actor.id),
            updated_at: self.clock.now(),
        };

        let saved = self.settings.upsert(settings).await?;
        tracing::info!(updated_by = %actor.id, "Blog settings updated");
        Ok(saved)
    }
}
