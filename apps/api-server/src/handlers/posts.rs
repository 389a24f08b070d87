//! Post lifecycle endpoints.

use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use uuid::Uuid;

use quill_core::domain::{Field, NewPost, Post, PostStatus, PostWithRelations};
use quill_core::ports::{Page, PostQuery, PostSort, SortDirection};
use quill_core::service::EditPost;
use quill_shared::{
    CreatePostRequest, PageResponse, PostDetailResponse, PostResponse, PublishedPostResponse,
    SchedulePostRequest, SweepResponse, UpdatePostRequest,
};

use crate::middleware::{AppError, AppResult, Identity, OptionalIdentity};
use crate::state::AppState;

pub(crate) fn post_response(post: Post) -> PostResponse {
    PostResponse {
        id: post.id,
        author_id: post.author_id,
        title: post.title,
        slug: post.slug,
        content: post.content,
        excerpt: post.excerpt,
        featured_image_url: post.featured_image_url,
        meta_title: post.meta_title,
        meta_description: post.meta_description,
        status: post.status.as_str().to_string(),
        published_at: post.published_at,
        scheduled_at: post.scheduled_at,
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

fn detail_response(full: PostWithRelations) -> PostDetailResponse {
    PostDetailResponse {
        post: post_response(full.post),
        category_ids: full.category_ids,
        tag_ids: full.tag_ids,
        view_count: full.view_count,
    }
}

fn page_response(page: Page<Post>) -> PageResponse<PostResponse> {
    PageResponse {
        items: page.items.into_iter().map(post_response).collect(),
        page: page.page,
        per_page: page.per_page,
        total: page.total,
    }
}

/// Listing query string. `status=all` lifts the published-only default;
/// any other unknown status value is rejected rather than ignored.
#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub author_id: Option<Uuid>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub tag_id: Option<Uuid>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub per_page: Option<u64>,
}

impl ListPostsQuery {
    fn into_query(self) -> Result<PostQuery, AppError> {
        let defaults = PostQuery::default();

        let status = match self.status.as_deref() {
            None => Some(PostStatus::Published),
            Some("all") => None,
            Some(s) => Some(PostStatus::parse(s).ok_or_else(|| {
                AppError::BadRequest(format!("unknown status filter: {}", s))
            })?),
        };

        let sort = match self.sort.as_deref() {
            None => defaults.sort,
            Some(s) => PostSort::parse(s)
                .ok_or_else(|| AppError::BadRequest(format!("unknown sort field: {}", s)))?,
        };

        let direction = match self.direction.as_deref() {
            None => defaults.direction,
            Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            Some(d) => {
                return Err(AppError::BadRequest(format!(
                    "unknown sort direction: {}",
                    d
                )));
            }
        };

        Ok(PostQuery {
            status,
            author_id: self.author_id,
            category_id: self.category_id,
            tag_id: self.tag_id,
            search: self.search,
            sort,
            direction,
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        })
    }
}

/// GET /api/posts
pub async fn list(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    query: web::Query<ListPostsQuery>,
) -> AppResult<HttpResponse> {
    let actor = identity.actor();
    let page = state
        .posts
        .list_posts(actor.as_ref(), query.into_inner().into_query()?)
        .await?;
    Ok(HttpResponse::Ok().json(page_response(page)))
}

/// POST /api/posts
pub async fn create(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let input = NewPost {
        title: req.title,
        content: req.content,
        excerpt: req.excerpt,
        featured_image_url: req.featured_image_url,
        meta_title: req.meta_title,
        meta_description: req.meta_description,
        status: req.status,
        scheduled_at: req.scheduled_at,
        category_ids: req.category_ids.unwrap_or_default(),
        tag_ids: req.tag_ids.unwrap_or_default(),
    };

    let actor = identity.actor();
    let post = state.posts.create_post(actor.as_ref(), input).await?;
    Ok(HttpResponse::Created().json(post_response(post)))
}

/// GET /api/posts/{id}
pub async fn get(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let actor = identity.actor();
    let full = state
        .posts
        .get_post(actor.as_ref(), path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(detail_response(full)))
}

/// PUT /api/posts/{id}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let edit = EditPost {
        title: req.title,
        content: req.content,
        excerpt: Field::from_option(req.excerpt),
        featured_image_url: Field::from_option(req.featured_image_url),
        meta_title: Field::from_option(req.meta_title),
        meta_description: Field::from_option(req.meta_description),
        tag_ids: req.tag_ids,
        category_ids: req.category_ids,
        create_version: req.create_version.unwrap_or(true),
    };

    let post = state
        .posts
        .update_post(&identity.actor(), path.into_inner(), edit)
        .await?;
    Ok(HttpResponse::Ok().json(post_response(post)))
}

/// DELETE /api/posts/{id}
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .posts
        .delete_post(&identity.actor(), path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// DELETE /api/posts/{id}/draft
pub async fn delete_draft(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .posts
        .delete_draft(&identity.actor(), path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/posts/{id}/publish
pub async fn publish(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state
        .posts
        .publish_post(&identity.actor(), path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(post_response(post)))
}

/// POST /api/posts/{id}/schedule
pub async fn schedule(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<SchedulePostRequest>,
) -> AppResult<HttpResponse> {
    let post = state
        .posts
        .schedule_post(&identity.actor(), path.into_inner(), body.scheduled_at)
        .await?;
    Ok(HttpResponse::Ok().json(post_response(post)))
}

/// GET /api/posts/due
///
/// Editorial visibility into the sweep queue. Editors and admins only.
pub async fn list_due(
    state: web::Data<AppState>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    require_privileged(&identity)?;
    let due = state.posts.list_due().await?;
    let items: Vec<PostResponse> = due.into_iter().map(post_response).collect();
    Ok(HttpResponse::Ok().json(items))
}

/// POST /api/posts/publish-due
///
/// Manual trigger for the scheduled-publish sweep. The same routine the
/// background job runs; invoking it when nothing is due is a no-op.
pub async fn publish_due(
    state: web::Data<AppState>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    require_privileged(&identity)?;
    let published = state.posts.sweep_publish().await?;
    let response = SweepResponse {
        published: published
            .into_iter()
            .map(|p| PublishedPostResponse {
                id: p.id,
                title: p.title,
                published_at: p.published_at,
            })
            .collect(),
    };
    Ok(HttpResponse::Ok().json(response))
}

fn require_privileged(identity: &Identity) -> Result<(), AppError> {
    if identity.actor().role.is_privileged() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Wire context for a view record.
pub(crate) fn client_info(req: &HttpRequest) -> (Option<String>, Option<String>) {
    let ip = req
        .connection_info()
        .realip_remote_addr()
        .map(String::from);
    let user_agent = req
        .headers()
        .get(actix_web::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    (ip, user_agent)
}
