use futures_util::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, to_bson, Bson, DateTime};
use mongodb::options::FindOptions;
use mongodb::{Collection, Database};

use crate::error::{AppError, AppResult};
use crate::models::{Conversation, Message};

fn collection(db: &Database) -> Collection<Conversation> {
    db.collection::<Conversation>(super::CONVERSATIONS)
}

pub async fn insert(db: &Database, conversation: &Conversation) -> AppResult<()> {
    collection(db).insert_one(conversation, None).await?;
    Ok(())
}

pub async fn find_by_id(db: &Database, id: ObjectId) -> AppResult<Option<Conversation>> {
    Ok(collection(db).find_one(doc! { "_id": id }, None).await?)
}

/// Conversations the user participates in, most recently updated first.
pub async fn list_for_user(db: &Database, user: ObjectId) -> AppResult<Vec<Conversation>> {
    let options = FindOptions::builder()
        .sort(doc! { "updated_at": -1 })
        .build();
    let cursor = collection(db)
        .find(doc! { "participants": user }, options)
        .await?;
    Ok(cursor.try_collect().await?)
}

/// Find a conversation whose participant set matches exactly.
pub async fn find_by_exact_participants(
    db: &Database,
    participants: &[ObjectId],
) -> AppResult<Option<Conversation>> {
    let id_list: Vec<Bson> = participants.iter().map(|id| Bson::ObjectId(*id)).collect();
    Ok(collection(db)
        .find_one(
            doc! {
                "participants": {
                    "$all": id_list,
                    "$size": participants.len() as i64,
                }
            },
            None,
        )
        .await?)
}

/// Append a message to the embedded history and bump `updated_at`.
/// Returns false when the conversation does not exist.
pub async fn append_message(
    db: &Database,
    id: ObjectId,
    message: &Message,
) -> AppResult<bool> {
    let message_bson = to_bson(message)
        .map_err(|e| AppError::Internal(format!("failed to encode message: {e}")))?;
    let result = collection(db)
        .update_one(
            doc! { "_id": id },
            doc! {
                "$push": { "messages": message_bson },
                "$set": { "updated_at": DateTime::from_chrono(message.created_at) },
            },
            None,
        )
        .await?;
    Ok(result.matched_count > 0)
}
