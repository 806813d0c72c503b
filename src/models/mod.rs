pub mod conversation;
pub mod notification;
pub mod post;
pub mod user;

pub use conversation::{Conversation, ConversationResponse, Message, MessageResponse};
pub use notification::{Notification, NotificationKind, NotificationResponse};
pub use post::{Comment, CommentResponse, Post, PostResponse};
pub use user::{PublicUser, User, UserResponse};

/// BSON datetime round-trip for optional chrono timestamps.
///
/// The driver ships a helper for `DateTime<Utc>` but not for
/// `Option<DateTime<Utc>>`, which `Notification.read_at` needs.
pub mod bson_datetime_option {
    use chrono::{DateTime, Utc};
    use mongodb::bson;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value
            .map(bson::DateTime::from_chrono)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<bson::DateTime>::deserialize(deserializer)?.map(|dt| dt.to_chrono()))
    }
}
