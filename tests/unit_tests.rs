//! Unit tests for ripple-api core functionality
//!
//! This test module covers:
//! - Document round-trips through BSON (field renames, datetimes)
//! - Response DTO population (query-time joins)
//! - Notification kind wire format

use std::collections::HashMap;

use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{from_document, to_document};
use ripple_api::models::*;

#[test]
fn notification_kind_serialization() {
    let kinds = vec![
        (NotificationKind::Message, "\"message\""),
        (NotificationKind::Like, "\"like\""),
        (NotificationKind::Comment, "\"comment\""),
    ];

    for (kind, wire) in kinds {
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, wire);
        let deserialized: NotificationKind = serde_json::from_str(&json).unwrap();
        assert_eq!(kind, deserialized);
        assert_eq!(format!("\"{}\"", kind.as_str()), wire);
    }
}

#[test]
fn user_document_round_trips_with_id_rename() {
    let user = User::new(
        "alice".to_string(),
        "alice@example.com".to_string(),
        "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        Some("/uploads/a.png".to_string()),
    );

    let doc = to_document(&user).unwrap();
    assert!(doc.contains_key("_id"));
    assert!(!doc.contains_key("id"));

    let decoded: User = from_document(doc).unwrap();
    assert_eq!(decoded.id, user.id);
    assert_eq!(decoded.username, "alice");
    assert_eq!(
        decoded.created_at.timestamp_millis(),
        user.created_at.timestamp_millis()
    );
}

#[test]
fn notification_read_at_round_trips_through_bson() {
    let mut notification = Notification::new(
        ObjectId::new(),
        NotificationKind::Like,
        "Someone liked your post".to_string(),
    );

    let doc = to_document(&notification).unwrap();
    let decoded: Notification = from_document(doc).unwrap();
    assert!(decoded.read_at.is_none());

    notification.read_at = Some(Utc::now());
    let doc = to_document(&notification).unwrap();
    let decoded: Notification = from_document(doc).unwrap();
    assert_eq!(
        decoded.read_at.unwrap().timestamp_millis(),
        notification.read_at.unwrap().timestamp_millis()
    );
}

#[test]
fn user_response_never_carries_the_password_hash() {
    let user = User::new(
        "bob".to_string(),
        "bob@example.com".to_string(),
        "$argon2id$secret".to_string(),
        None,
    );

    let json = serde_json::to_string(&UserResponse::from(&user)).unwrap();
    assert!(!json.contains("argon2id"));
    assert!(!json.contains("password"));
    assert!(json.contains(&user.id.to_hex()));
}

#[test]
fn post_response_populates_author_and_comment_users() {
    let author = User::new(
        "carol".to_string(),
        "carol@example.com".to_string(),
        "hash".to_string(),
        Some("/uploads/c.jpg".to_string()),
    );
    let commenter = User::new(
        "dave".to_string(),
        "dave@example.com".to_string(),
        "hash".to_string(),
        None,
    );

    let mut post = Post::new(author.id, "first post".to_string(), None);
    post.comments.push(Comment::new(commenter.id, "nice".to_string()));
    // A comment from a since-deleted user stays but renders anonymously.
    post.comments
        .push(Comment::new(ObjectId::new(), "orphaned".to_string()));

    let mut users = HashMap::new();
    users.insert(author.id, author.clone());
    users.insert(commenter.id, commenter.clone());

    let response = PostResponse::from_post(&post, &users);
    assert_eq!(response.author.as_ref().unwrap().username, "carol");
    assert_eq!(response.comments.len(), 2);
    assert_eq!(
        response.comments[0].user.as_ref().unwrap().username,
        "dave"
    );
    assert!(response.comments[1].user.is_none());
}

#[test]
fn conversation_response_skips_unknown_participants() {
    let known = User::new(
        "erin".to_string(),
        "erin@example.com".to_string(),
        "hash".to_string(),
        None,
    );
    let conversation = Conversation::new(vec![known.id, ObjectId::new()]);

    let mut users = HashMap::new();
    users.insert(known.id, known);

    let response = ConversationResponse::from_conversation(&conversation, &users);
    assert_eq!(response.participants.len(), 1);
    assert_eq!(response.participants[0].username, "erin");
}

#[test]
fn message_response_resolves_sender_username() {
    let sender = User::new(
        "frank".to_string(),
        "frank@example.com".to_string(),
        "hash".to_string(),
        None,
    );
    let conversation_id = ObjectId::new();
    let message = Message::new(sender.id, "hello".to_string());

    let mut users = HashMap::new();
    users.insert(sender.id, sender.clone());

    let response = MessageResponse::from_message(conversation_id, &message, &users);
    assert_eq!(response.conversation_id, conversation_id.to_hex());
    assert_eq!(response.sender_id, sender.id.to_hex());
    assert_eq!(response.sender_username.as_deref(), Some("frank"));

    // Unknown sender degrades to an anonymous message.
    let response = MessageResponse::from_message(conversation_id, &message, &HashMap::new());
    assert!(response.sender_username.is_none());
}
