use actix_web::{web, HttpResponse};
use mongodb::bson::oid::ObjectId;

use crate::db::notification_repo;
use crate::error::{AppError, AppResult};
use crate::middleware::{JwtAuthMiddleware, UserId};
use crate::models::NotificationResponse;
use crate::state::AppState;

/// List the caller's notifications, newest first.
#[utoipa::path(
    get,
    path = "/api/notifications",
    responses((status = 200, description = "Notifications", body = [NotificationResponse])),
    tag = "Notifications"
)]
pub async fn list_notifications(state: web::Data<AppState>, user: UserId) -> AppResult<HttpResponse> {
    let notifications = notification_repo::list_for_user(&state.db, user.0).await?;
    let responses: Vec<NotificationResponse> =
        notifications.iter().map(NotificationResponse::from).collect();
    Ok(HttpResponse::Ok().json(responses))
}

/// Mark one of the caller's notifications as read.
#[utoipa::path(
    put,
    path = "/api/notifications/{id}/read",
    params(("id" = String, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Updated notification", body = NotificationResponse),
        (status = 403, description = "Not the notification owner"),
        (status = 404, description = "Notification not found"),
    ),
    tag = "Notifications"
)]
pub async fn mark_read(
    state: web::Data<AppState>,
    user: UserId,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = ObjectId::parse_str(path.into_inner().as_str())?;

    let notification = notification_repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;
    if notification.user != user.0 {
        return Err(AppError::Authorization(
            "You can only read your own notifications".to_string(),
        ));
    }

    let updated = notification_repo::mark_read(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

    Ok(HttpResponse::Ok().json(NotificationResponse::from(&updated)))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/notifications")
            .wrap(JwtAuthMiddleware)
            .route("", web::get().to(list_notifications))
            .route("/{id}/read", web::put().to(mark_read)),
    );
}
