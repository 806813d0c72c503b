use std::collections::HashMap;

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::user::{PublicUser, User};

/// Message embedded in a conversation document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub sender: ObjectId,
    pub text: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(sender: ObjectId, text: String) -> Self {
        Self {
            sender,
            text,
            created_at: Utc::now(),
        }
    }
}

/// Conversation document with embedded message history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub participants: Vec<ObjectId>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(participants: Vec<ObjectId>) -> Self {
        Self {
            id: ObjectId::new(),
            participants,
            messages: Vec::new(),
            updated_at: Utc::now(),
        }
    }
}

/// Deduplicate a requested participant list and make sure the creator
/// is part of the set. Order of first appearance is preserved.
pub fn participant_set(creator: ObjectId, requested: &[ObjectId]) -> Vec<ObjectId> {
    let mut participants: Vec<ObjectId> = Vec::with_capacity(requested.len() + 1);
    for id in requested.iter().copied().chain(std::iter::once(creator)) {
        if !participants.contains(&id) {
            participants.push(id);
        }
    }
    participants
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub conversation_id: String,
    pub sender_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_username: Option<String>,
    pub text: String,
    pub created_at: String,
}

impl MessageResponse {
    pub fn from_message(
        conversation_id: ObjectId,
        message: &Message,
        users: &HashMap<ObjectId, User>,
    ) -> Self {
        Self {
            conversation_id: conversation_id.to_hex(),
            sender_id: message.sender.to_hex(),
            sender_username: users.get(&message.sender).map(|u| u.username.clone()),
            text: message.text.clone(),
            created_at: message.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConversationResponse {
    pub id: String,
    pub participants: Vec<PublicUser>,
    pub updated_at: String,
}

impl ConversationResponse {
    pub fn from_conversation(
        conversation: &Conversation,
        users: &HashMap<ObjectId, User>,
    ) -> Self {
        Self {
            id: conversation.id.to_hex(),
            participants: conversation
                .participants
                .iter()
                .filter_map(|id| users.get(id).map(PublicUser::from))
                .collect(),
            updated_at: conversation.updated_at.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participant_set_includes_creator() {
        let creator = ObjectId::new();
        let other = ObjectId::new();

        let set = participant_set(creator, &[other]);
        assert_eq!(set, vec![other, creator]);
    }

    #[test]
    fn participant_set_deduplicates() {
        let creator = ObjectId::new();
        let other = ObjectId::new();

        // Creator listed explicitly and a duplicate participant collapse.
        let set = participant_set(creator, &[other, creator, other]);
        assert_eq!(set, vec![other, creator]);
    }
}
