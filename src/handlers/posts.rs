use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use mongodb::bson::oid::ObjectId;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::db::{post_repo, user_repo};
use crate::error::{AppError, AppResult};
use crate::middleware::{JwtAuthMiddleware, UserId};
use crate::models::{Comment, Post, PostResponse};
use crate::state::AppState;

use super::collect_multipart;

const DEFAULT_FEED_LIMIT: i64 = 20;

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<i64>,
    pub skip: Option<u64>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CommentRequest {
    #[validate(length(min = 1))]
    pub text: String,
}

/// Resolve referenced users for a batch of posts and build responses.
async fn populate(state: &AppState, posts: &[Post]) -> AppResult<Vec<PostResponse>> {
    let mut ids: Vec<ObjectId> = Vec::new();
    for post in posts {
        for id in PostResponse::referenced_users(post) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    let users = user_repo::find_map_by_ids(&state.db, &ids).await?;
    Ok(posts
        .iter()
        .map(|post| PostResponse::from_post(post, &users))
        .collect())
}

async fn populate_one(state: &AppState, post: &Post) -> AppResult<PostResponse> {
    let mut responses = populate(state, std::slice::from_ref(post)).await?;
    Ok(responses.remove(0))
}

/// Create a post. Multipart form: `content` plus an optional `image`.
#[utoipa::path(
    post,
    path = "/api/posts",
    responses(
        (status = 201, description = "Post created", body = PostResponse),
        (status = 400, description = "Missing content"),
    ),
    tag = "Posts"
)]
pub async fn create_post(
    state: web::Data<AppState>,
    user: UserId,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let (fields, image_file) = collect_multipart(payload, "image").await?;

    let content = fields
        .get("content")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("content is required".to_string()))?;

    let image = match image_file {
        Some(file) => Some(state.storage.store_image(&file.filename, file.bytes).await?),
        None => None,
    };

    let post = Post::new(user.0, content, image);
    post_repo::insert(&state.db, &post).await?;

    tracing::info!(post_id = %post.id, author = %user.0, "post created");

    let response = populate_one(&state, &post).await?;
    Ok(HttpResponse::Created().json(response))
}

/// Paginated feed, newest first, authors populated.
#[utoipa::path(
    get,
    path = "/api/posts",
    params(
        ("limit" = Option<i64>, Query, description = "Page size, default 20"),
        ("skip" = Option<u64>, Query, description = "Offset, default 0"),
    ),
    responses((status = 200, description = "Feed page", body = [PostResponse])),
    tag = "Posts"
)]
pub async fn feed(
    state: web::Data<AppState>,
    query: web::Query<FeedQuery>,
) -> AppResult<HttpResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_FEED_LIMIT);
    let skip = query.skip.unwrap_or(0);

    let posts = post_repo::list(&state.db, limit, skip).await?;
    let responses = populate(&state, &posts).await?;
    Ok(HttpResponse::Ok().json(responses))
}

/// Fetch a single post with author and comment users populated.
#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "The post", body = PostResponse),
        (status = 404, description = "Post not found"),
    ),
    tag = "Posts"
)]
pub async fn get_post(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = ObjectId::parse_str(path.into_inner().as_str())?;

    let post = post_repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    let response = populate_one(&state, &post).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Toggle the caller's like on a post.
#[utoipa::path(
    post,
    path = "/api/posts/{id}/like",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Updated post", body = PostResponse),
        (status = 404, description = "Post not found"),
    ),
    tag = "Posts"
)]
pub async fn like_post(
    state: web::Data<AppState>,
    user: UserId,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = ObjectId::parse_str(path.into_inner().as_str())?;

    let mut post = post_repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    let liked = post.toggle_like(user.0);
    let updated = post_repo::set_likes(&state.db, id, &post.likes)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    tracing::debug!(post_id = %id, user_id = %user.0, liked, "like toggled");

    let response = populate_one(&state, &updated).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Comment on a post.
#[utoipa::path(
    post,
    path = "/api/posts/{id}/comment",
    request_body = CommentRequest,
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Updated post", body = PostResponse),
        (status = 404, description = "Post not found"),
    ),
    tag = "Posts"
)]
pub async fn comment_post(
    state: web::Data<AppState>,
    user: UserId,
    path: web::Path<String>,
    body: web::Json<CommentRequest>,
) -> AppResult<HttpResponse> {
    let id = ObjectId::parse_str(path.into_inner().as_str())?;
    let request = body.into_inner();
    request.validate()?;

    let comment = Comment::new(user.0, request.text);
    let updated = post_repo::push_comment(&state.db, id, &comment)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    let response = populate_one(&state, &updated).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/posts")
            .wrap(JwtAuthMiddleware)
            .route("", web::post().to(create_post))
            .route("", web::get().to(feed))
            .route("/{id}", web::get().to(get_post))
            .route("/{id}/like", web::post().to(like_post))
            .route("/{id}/comment", web::post().to(comment_post)),
    );
}
