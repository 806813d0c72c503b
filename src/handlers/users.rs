use actix_web::{web, HttpResponse};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::Document;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::db::{notification_repo, post_repo, user_repo};
use crate::error::{AppError, AppResult};
use crate::middleware::{JwtAuthMiddleware, UserId};
use crate::models::{PublicUser, UserResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub username: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    pub avatar: Option<String>,
}

/// Search users by username fragment, excluding the caller.
#[utoipa::path(
    get,
    path = "/api/users/search",
    params(("username" = String, Query, description = "Username fragment")),
    responses(
        (status = 200, description = "Matching users", body = [PublicUser]),
        (status = 400, description = "Missing username query"),
        (status = 404, description = "No users matched"),
    ),
    tag = "Users"
)]
pub async fn search(
    state: web::Data<AppState>,
    user: UserId,
    query: web::Query<SearchQuery>,
) -> AppResult<HttpResponse> {
    let fragment = query
        .username
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Username query is required".to_string()))?;

    let users = user_repo::search_by_username(&state.db, fragment, user.0).await?;
    if users.is_empty() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let results: Vec<PublicUser> = users.iter().map(PublicUser::from).collect();
    Ok(HttpResponse::Ok().json(results))
}

/// Get a user profile by id.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 404, description = "User not found"),
    ),
    tag = "Users"
)]
pub async fn get_profile(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = ObjectId::parse_str(path.into_inner().as_str())?;

    let user = user_repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(UserResponse::from(&user)))
}

/// Update the caller's own profile.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    request_body = UpdateUserRequest,
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 403, description = "Not the profile owner"),
        (status = 404, description = "User not found"),
    ),
    tag = "Users"
)]
pub async fn update_profile(
    state: web::Data<AppState>,
    user: UserId,
    path: web::Path<String>,
    body: web::Json<UpdateUserRequest>,
) -> AppResult<HttpResponse> {
    let id = ObjectId::parse_str(path.into_inner().as_str())?;
    if id != user.0 {
        return Err(AppError::Authorization(
            "You can only update your own profile".to_string(),
        ));
    }

    let request = body.into_inner();
    request.validate()?;

    let mut updates = Document::new();
    if let Some(username) = request.username {
        updates.insert("username", username);
    }
    if let Some(email) = request.email {
        updates.insert("email", email);
    }
    if let Some(avatar) = request.avatar {
        updates.insert("avatar", avatar);
    }

    let updated = user_repo::update_profile(&state.db, id, updates)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(UserResponse::from(&updated)))
}

/// Delete the caller's account and cascade over owned data.
///
/// The cascade is intentionally partial: the user's posts and
/// notifications go, but comments and likes left on other users' posts
/// and conversation memberships remain as dangling references.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User and related data deleted"),
        (status = 403, description = "Not the account owner"),
        (status = 404, description = "User not found"),
    ),
    tag = "Users"
)]
pub async fn delete_account(
    state: web::Data<AppState>,
    user: UserId,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = ObjectId::parse_str(path.into_inner().as_str())?;
    if id != user.0 {
        return Err(AppError::Authorization(
            "You can only delete your own account".to_string(),
        ));
    }

    let posts_removed = post_repo::delete_by_author(&state.db, id).await?;
    let notifications_removed = notification_repo::delete_for_user(&state.db, id).await?;
    let deleted = user_repo::delete(&state.db, id).await?;
    if !deleted {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    tracing::info!(
        user_id = %id,
        posts_removed,
        notifications_removed,
        "user account deleted"
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "User and related data deleted successfully"
    })))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/users")
            .wrap(JwtAuthMiddleware)
            .route("/search", web::get().to(search))
            .route("/{id}", web::get().to(get_profile))
            .route("/{id}", web::put().to(update_profile))
            .route("/{id}", web::delete().to(delete_account)),
    );
}
