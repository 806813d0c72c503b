use mongodb::bson::oid::ObjectId;
use mongodb::Database;

use crate::db::notification_repo;
use crate::error::AppResult;
use crate::models::{Notification, NotificationKind, NotificationResponse};
use crate::websocket::{ConnectionRegistry, Room, WsOutboundEvent};

/// Persist a notification and push it to the target user's
/// notification room. The push is best-effort: a user with no open
/// connection simply finds the record later via the REST listing.
pub async fn dispatch(
    db: &Database,
    registry: &ConnectionRegistry,
    user_id: ObjectId,
    kind: NotificationKind,
    message: String,
) -> AppResult<NotificationResponse> {
    let notification = Notification::new(user_id, kind, message);
    notification_repo::insert(db, &notification).await?;

    let response = NotificationResponse::from(&notification);
    let event = WsOutboundEvent::ReceiveNotification {
        notification: response.clone(),
    };
    match serde_json::to_string(&event) {
        Ok(payload) => {
            registry
                .broadcast(Room::Notifications(user_id), payload)
                .await;
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize receiveNotification event");
        }
    }

    tracing::debug!(
        user_id = %user_id,
        kind = kind.as_str(),
        "notification dispatched"
    );

    Ok(response)
}
