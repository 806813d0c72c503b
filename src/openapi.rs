use actix_web::web;
use utoipa::OpenApi;

use crate::handlers::{auth, conversations, notifications, posts, users};
use crate::models::{
    ConversationResponse, MessageResponse, NotificationKind, NotificationResponse, PostResponse,
    PublicUser, UserResponse,
};

/// OpenAPI specification for the Ripple API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ripple API",
        description = "Social backend: auth, posts, real-time messaging and notifications",
        version = "0.1.0",
    ),
    paths(
        auth::register,
        auth::login,
        users::search,
        users::get_profile,
        users::update_profile,
        users::delete_account,
        posts::create_post,
        posts::feed,
        posts::get_post,
        posts::like_post,
        posts::comment_post,
        conversations::list_conversations,
        conversations::create_conversation,
        conversations::get_messages,
        notifications::list_notifications,
        notifications::mark_read,
    ),
    components(schemas(
        auth::RegisterRequest,
        auth::LoginRequest,
        auth::AuthResponse,
        users::UpdateUserRequest,
        posts::CommentRequest,
        conversations::CreateConversationRequest,
        UserResponse,
        PublicUser,
        PostResponse,
        crate::models::CommentResponse,
        ConversationResponse,
        MessageResponse,
        NotificationResponse,
        NotificationKind,
    )),
    tags(
        (name = "Auth", description = "Registration and login"),
        (name = "Users", description = "User search and profiles"),
        (name = "Posts", description = "Posts, likes and comments"),
        (name = "Conversations", description = "Direct messaging"),
        (name = "Notifications", description = "Notification listing and read state"),
    )
)]
pub struct ApiDoc;

pub async fn serve() -> web::Json<utoipa::openapi::OpenApi> {
    web::Json(ApiDoc::openapi())
}
