use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// What triggered a notification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Message,
    Like,
    Comment,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Message => "message",
            NotificationKind::Like => "like",
            NotificationKind::Comment => "comment",
        }
    }
}

/// Notification document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user: ObjectId,
    pub kind: NotificationKind,
    pub message: String,
    #[serde(default, with = "super::bson_datetime_option")]
    pub read_at: Option<DateTime<Utc>>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(user: ObjectId, kind: NotificationKind, message: String) -> Self {
        Self {
            id: ObjectId::new(),
            user,
            kind,
            message,
            read_at: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NotificationResponse {
    pub id: String,
    pub user_id: String,
    pub kind: NotificationKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_at: Option<String>,
    pub created_at: String,
}

impl From<&Notification> for NotificationResponse {
    fn from(notification: &Notification) -> Self {
        Self {
            id: notification.id.to_hex(),
            user_id: notification.user.to_hex(),
            kind: notification.kind,
            message: notification.message.clone(),
            read_at: notification.read_at.map(|dt| dt.to_rfc3339()),
            created_at: notification.created_at.to_rfc3339(),
        }
    }
}
