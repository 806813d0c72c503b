use std::collections::HashMap;

use mongodb::bson::oid::ObjectId;
use mongodb::Database;

use crate::db::{conversation_repo, user_repo};
use crate::error::AppResult;
use crate::models::{Message, MessageResponse, NotificationKind};
use crate::services::notifier;
use crate::websocket::{ConnectionRegistry, Room, WsOutboundEvent};

/// Real-time messaging fan-out.
///
/// The send path is a single non-atomic sequence: persist the message,
/// broadcast it to every participant's room, then create and push a
/// notification for each participant other than the sender. There is no
/// transaction or retry around the steps; concurrent sends to the same
/// conversation are ordered only by the store's document write ordering.
pub struct ChatService;

impl ChatService {
    /// Append a message to a conversation and fan it out.
    ///
    /// Returns `None` (without emitting anything) when the conversation
    /// does not exist.
    pub async fn send_message(
        db: &Database,
        registry: &ConnectionRegistry,
        conversation_id: ObjectId,
        sender_id: ObjectId,
        text: String,
    ) -> AppResult<Option<MessageResponse>> {
        let Some(conversation) = conversation_repo::find_by_id(db, conversation_id).await? else {
            tracing::warn!(
                conversation_id = %conversation_id,
                "message dropped: conversation not found"
            );
            return Ok(None);
        };

        let message = Message::new(sender_id, text);
        conversation_repo::append_message(db, conversation_id, &message).await?;

        // Query-time join for the sender's username; a dangling sender
        // reference (deleted account) degrades to an anonymous message.
        let sender = user_repo::find_by_id(db, sender_id).await?;
        let sender_username = sender.as_ref().map(|u| u.username.clone());

        let users: HashMap<ObjectId, _> = sender.into_iter().map(|u| (u.id, u)).collect();
        let response = MessageResponse::from_message(conversation_id, &message, &users);

        let event = WsOutboundEvent::ReceiveMessage {
            message: response.clone(),
        };
        match serde_json::to_string(&event) {
            Ok(payload) => {
                for participant in &conversation.participants {
                    registry
                        .broadcast(Room::User(*participant), payload.clone())
                        .await;
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize receive_message event");
            }
        }

        let notification_text = format!(
            "New message from {}",
            sender_username.as_deref().unwrap_or("someone")
        );
        for recipient in notification_recipients(&conversation.participants, sender_id) {
            if let Err(e) = notifier::dispatch(
                db,
                registry,
                recipient,
                NotificationKind::Message,
                notification_text.clone(),
            )
            .await
            {
                // Partial notification creation is possible here; the
                // remaining recipients still get theirs.
                tracing::error!(
                    recipient = %recipient,
                    error = %e,
                    "failed to create message notification"
                );
            }
        }

        tracing::info!(
            conversation_id = %conversation_id,
            sender_id = %sender_id,
            participants = conversation.participants.len(),
            "message fanned out"
        );

        Ok(Some(response))
    }
}

/// Participants that should be notified about a message: everyone in
/// the conversation except the sender, deduplicated.
pub fn notification_recipients(participants: &[ObjectId], sender: ObjectId) -> Vec<ObjectId> {
    let mut recipients = Vec::with_capacity(participants.len());
    for id in participants.iter().copied() {
        if id != sender && !recipients.contains(&id) {
            recipients.push(id);
        }
    }
    recipients
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipients_exclude_sender() {
        let sender = ObjectId::new();
        let other = ObjectId::new();

        let recipients = notification_recipients(&[sender, other], sender);
        assert_eq!(recipients, vec![other]);
    }

    #[test]
    fn recipients_deduplicate() {
        let sender = ObjectId::new();
        let other = ObjectId::new();

        // A malformed participant list with duplicates still yields one
        // notification per user.
        let recipients = notification_recipients(&[other, other, sender], sender);
        assert_eq!(recipients, vec![other]);
    }

    #[test]
    fn sender_alone_means_no_recipients() {
        let sender = ObjectId::new();
        assert!(notification_recipients(&[sender], sender).is_empty());
    }
}
