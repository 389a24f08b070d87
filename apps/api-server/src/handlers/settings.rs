//! Singleton blog settings endpoints.

use actix_web::{HttpResponse, web};

use quill_core::domain::BlogSettings;
use quill_core::service::UpdateSettings;
use quill_shared::{SettingsResponse, UpdateSettingsRequest};

use crate::middleware::{AppResult, Identity};
use crate::state::AppState;

fn settings_response(s: BlogSettings) -> SettingsResponse {
    SettingsResponse {
        blog_title: s.blog_title,
        blog_tagline: s.blog_tagline,
        blog_description: s.blog_description,
        posts_per_page: s.posts_per_page,
        allow_comments: s.allow_comments,
        updated_by: s.updated_by,
        updated_at: s.updated_at,
    }
}

/// GET /api/settings
pub async fn get(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let settings = state.settings.get().await?;
    Ok(HttpResponse::Ok().json(settings_response(settings)))
}

/// PUT /api/settings
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<UpdateSettingsRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let input = UpdateSettings {
        blog_title: req.blog_title,
        blog_tagline: req.blog_tagline,
        blog_description: req.blog_description,
        posts_per_page: req.posts_per_page,
        allow_comments: req.allow_comments,
    };
    let settings = state.settings.update(&identity.actor(), input).await?;
    Ok(HttpResponse::Ok().json(settings_response(settings)))
}
