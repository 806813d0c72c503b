use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::db::user_repo;
use crate::error::{AppError, AppResult};
use crate::models::{User, UserResponse};
use crate::security::{jwt, password};
use crate::state::AppState;

use super::collect_multipart;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

/// Register a new user.
///
/// Multipart form: `username`, `email`, `password` and an optional
/// `avatar` image.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Validation failed or user exists"),
    ),
    tag = "Auth"
)]
pub async fn register(
    state: web::Data<AppState>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let (fields, avatar_file) = collect_multipart(payload, "avatar").await?;

    let required = |name: &str| {
        fields
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::BadRequest(format!("{name} is required")))
    };
    let request = RegisterRequest {
        username: required("username")?,
        email: required("email")?,
        password: required("password")?,
    };
    request.validate()?;

    if user_repo::find_by_email(&state.db, &request.email)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest("User already exists".to_string()));
    }

    let avatar = match avatar_file {
        Some(file) => Some(state.storage.store_image(&file.filename, file.bytes).await?),
        None => None,
    };

    let password_hash = password::hash_password(&request.password)?;
    let user = User::new(request.username, request.email, password_hash, avatar);
    user_repo::insert(&state.db, &user).await?;

    let token = jwt::generate_token(user.id, &user.email, &user.username)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok(HttpResponse::Created().json(AuthResponse {
        user: UserResponse::from(&user),
        token,
    }))
}

/// Log a user in and return a JWT.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Invalid credentials"),
    ),
    tag = "Auth"
)]
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let request = body.into_inner();
    request.validate()?;

    // Unknown email and wrong password are indistinguishable on the
    // wire.
    let user = user_repo::find_by_email(&state.db, &request.email)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid credentials".to_string()))?;

    if !password::verify_password(&request.password, &user.password_hash)? {
        return Err(AppError::BadRequest("Invalid credentials".to_string()));
    }

    let token = jwt::generate_token(user.id, &user.email, &user.username)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        user: UserResponse::from(&user),
        token,
    }))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/auth")
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login)),
    );
}
