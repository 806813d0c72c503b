use serde::{Deserialize, Serialize};

use crate::models::{MessageResponse, NotificationKind, NotificationResponse};

/// Inbound WebSocket events from client to server.
///
/// Event names are part of the wire contract shared with the clients;
/// the mixed naming (`send_message` vs `joinNotifications`) is kept
/// verbatim.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WsInboundEvent {
    /// Join the caller's conversation room and notification room.
    #[serde(rename = "join")]
    Join { user_id: String },

    /// Persist a message and fan it out to the conversation.
    #[serde(rename = "send_message")]
    SendMessage {
        conversation_id: String,
        text: String,
        sender_id: String,
    },

    /// Join the caller's notification room only.
    #[serde(rename = "joinNotifications")]
    JoinNotifications { user_id: String },

    /// Persist a notification for a user and push it to their
    /// notification room.
    #[serde(rename = "sendNotification")]
    SendNotification {
        user_id: String,
        kind: NotificationKind,
        message: String,
    },
}

/// Outbound WebSocket events from server to client.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WsOutboundEvent {
    #[serde(rename = "receive_message")]
    ReceiveMessage {
        #[serde(flatten)]
        message: MessageResponse,
    },

    #[serde(rename = "receiveNotification")]
    ReceiveNotification {
        #[serde(flatten)]
        notification: NotificationResponse,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_events_keep_original_wire_names() {
        let join: WsInboundEvent =
            serde_json::from_str(r#"{"type":"join","user_id":"abc"}"#).unwrap();
        assert!(matches!(join, WsInboundEvent::Join { .. }));

        let send: WsInboundEvent = serde_json::from_str(
            r#"{"type":"send_message","conversation_id":"c","text":"hi","sender_id":"s"}"#,
        )
        .unwrap();
        assert!(matches!(send, WsInboundEvent::SendMessage { .. }));

        let join_notifications: WsInboundEvent =
            serde_json::from_str(r#"{"type":"joinNotifications","user_id":"abc"}"#).unwrap();
        assert!(matches!(
            join_notifications,
            WsInboundEvent::JoinNotifications { .. }
        ));

        let send_notification: WsInboundEvent = serde_json::from_str(
            r#"{"type":"sendNotification","user_id":"abc","kind":"like","message":"m"}"#,
        )
        .unwrap();
        assert!(matches!(
            send_notification,
            WsInboundEvent::SendNotification {
                kind: NotificationKind::Like,
                ..
            }
        ));
    }

    #[test]
    fn outbound_message_event_is_tagged_and_flattened() {
        let event = WsOutboundEvent::ReceiveMessage {
            message: MessageResponse {
                conversation_id: "c1".to_string(),
                sender_id: "u1".to_string(),
                sender_username: Some("alice".to_string()),
                text: "hello".to_string(),
                created_at: "2026-01-01T00:00:00+00:00".to_string(),
            },
        };

        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&event).unwrap()).unwrap();
        assert_eq!(json["type"], "receive_message");
        assert_eq!(json["conversation_id"], "c1");
        assert_eq!(json["sender_username"], "alice");
    }
}
