//! View counter endpoints. Both are public; recording a view is what
//! the public reading frontend does on every page load.

use actix_web::{HttpRequest, HttpResponse, web};
use uuid::Uuid;

use quill_shared::ViewCountResponse;

use crate::handlers::posts::client_info;
use crate::middleware::AppResult;
use crate::state::AppState;

/// POST /api/posts/{id}/views
pub async fn record(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let (ip, user_agent) = client_info(&req);
    state
        .posts
        .record_view(path.into_inner(), ip, user_agent)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/posts/{id}/views
pub async fn count(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let view_count = state.posts.view_count(post_id).await?;
    Ok(HttpResponse::Ok().json(ViewCountResponse {
        post_id,
        view_count,
    }))
}
