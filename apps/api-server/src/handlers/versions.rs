//! Post version history endpoints.

use actix_web::{HttpResponse, web};
use serde::Deserialize;
use uuid::Uuid;

use quill_core::domain::PostVersion;
use quill_shared::{PageResponse, VersionResponse};

use crate::handlers::posts::post_response;
use crate::middleware::{AppResult, Identity};
use crate::state::AppState;

fn version_response(v: PostVersion) -> VersionResponse {
    VersionResponse {
        id: v.id,
        post_id: v.post_id,
        version_number: v.version_number,
        title: v.title,
        content: v.content,
        excerpt: v.excerpt,
        created_by: v.created_by,
        created_at: v.created_at,
    }
}

#[derive(Debug, Deserialize)]
pub struct VersionPageQuery {
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub per_page: Option<u64>,
}

/// GET /api/posts/{id}/versions
pub async fn list(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    query: web::Query<VersionPageQuery>,
) -> AppResult<HttpResponse> {
    let page = state
        .posts
        .list_versions(
            &identity.actor(),
            path.into_inner(),
            query.page.unwrap_or(1),
            query.per_page.unwrap_or(20),
        )
        .await?;
    let response = PageResponse {
        items: page.items.into_iter().map(version_response).collect(),
        page: page.page,
        per_page: page.per_page,
        total: page.total,
    };
    Ok(HttpResponse::Ok().json(response))
}

/// GET /api/posts/{id}/versions/{number}
pub async fn get(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, i32)>,
) -> AppResult<HttpResponse> {
    let (post_id, number) = path.into_inner();
    let version = state
        .posts
        .get_version(&identity.actor(), post_id, number)
        .await?;
    Ok(HttpResponse::Ok().json(version_response(version)))
}

/// POST /api/posts/{id}/versions
///
/// Manual snapshot of the post's current content.
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let version = state
        .posts
        .create_version(&identity.actor(), path.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(version_response(version)))
}

/// POST /api/posts/{id}/versions/{number}/restore
pub async fn restore(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Uuid, i32)>,
) -> AppResult<HttpResponse> {
    let (post_id, number) = path.into_inner();
    let post = state
        .posts
        .restore_version(&identity.actor(), post_id, number)
        .await?;
    Ok(HttpResponse::Ok().json(post_response(post)))
}
