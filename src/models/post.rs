use std::collections::HashMap;

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::user::{PublicUser, User};

/// Comment embedded in a post document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub user: ObjectId,
    pub text: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(user: ObjectId, text: String) -> Self {
        Self {
            user,
            text,
            created_at: Utc::now(),
        }
    }
}

/// Post document. Likes and comments are embedded, references resolved
/// at query time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub author: ObjectId,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub likes: Vec<ObjectId>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn new(author: ObjectId, content: String, image: Option<String>) -> Self {
        Self {
            id: ObjectId::new(),
            author,
            content,
            image,
            likes: Vec::new(),
            comments: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Toggle `user` in the likes list. Returns true when the user now
    /// likes the post, false when the like was removed.
    pub fn toggle_like(&mut self, user: ObjectId) -> bool {
        if self.likes.contains(&user) {
            self.likes.retain(|id| *id != user);
            false
        } else {
            self.likes.push(user);
            true
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommentResponse {
    pub user: Option<PublicUser>,
    pub text: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PostResponse {
    pub id: String,
    pub author: Option<PublicUser>,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub likes: Vec<String>,
    pub comments: Vec<CommentResponse>,
    pub created_at: String,
}

impl PostResponse {
    /// Build a response with author and comment users populated from a
    /// pre-fetched user map. Dangling references (deleted users) render
    /// as `None`.
    pub fn from_post(post: &Post, users: &HashMap<ObjectId, User>) -> Self {
        Self {
            id: post.id.to_hex(),
            author: users.get(&post.author).map(PublicUser::from),
            content: post.content.clone(),
            image: post.image.clone(),
            likes: post.likes.iter().map(|id| id.to_hex()).collect(),
            comments: post
                .comments
                .iter()
                .map(|comment| CommentResponse {
                    user: users.get(&comment.user).map(PublicUser::from),
                    text: comment.text.clone(),
                    created_at: comment.created_at.to_rfc3339(),
                })
                .collect(),
            created_at: post.created_at.to_rfc3339(),
        }
    }

    /// User ids that need to be fetched to populate this post's
    /// response (author and comment authors; likes render as raw ids).
    pub fn referenced_users(post: &Post) -> Vec<ObjectId> {
        let mut ids = vec![post.author];
        ids.extend(post.comments.iter().map(|c| c.user));
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_like_adds_then_removes() {
        let author = ObjectId::new();
        let user = ObjectId::new();
        let mut post = Post::new(author, "hello".to_string(), None);

        assert!(post.toggle_like(user));
        assert_eq!(post.likes, vec![user]);

        // Toggling again removes the like instead of duplicating it.
        assert!(!post.toggle_like(user));
        assert!(post.likes.is_empty());
    }

    #[test]
    fn toggle_like_is_per_user() {
        let mut post = Post::new(ObjectId::new(), "hello".to_string(), None);
        let alice = ObjectId::new();
        let bob = ObjectId::new();

        assert!(post.toggle_like(alice));
        assert!(post.toggle_like(bob));
        assert!(!post.toggle_like(alice));
        assert_eq!(post.likes, vec![bob]);
    }
}
