use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, DateTime};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{Collection, Database};

use crate::error::AppResult;
use crate::models::Notification;

fn collection(db: &Database) -> Collection<Notification> {
    db.collection::<Notification>(super::NOTIFICATIONS)
}

pub async fn insert(db: &Database, notification: &Notification) -> AppResult<()> {
    collection(db).insert_one(notification, None).await?;
    Ok(())
}

pub async fn find_by_id(db: &Database, id: ObjectId) -> AppResult<Option<Notification>> {
    Ok(collection(db).find_one(doc! { "_id": id }, None).await?)
}

/// All notifications for a user, newest first.
pub async fn list_for_user(db: &Database, user: ObjectId) -> AppResult<Vec<Notification>> {
    let options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .build();
    let cursor = collection(db).find(doc! { "user": user }, options).await?;
    Ok(cursor.try_collect().await?)
}

/// Stamp `read_at` and return the updated document.
pub async fn mark_read(db: &Database, id: ObjectId) -> AppResult<Option<Notification>> {
    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();
    Ok(collection(db)
        .find_one_and_update(
            doc! { "_id": id },
            doc! { "$set": { "read_at": DateTime::from_chrono(Utc::now()) } },
            options,
        )
        .await?)
}

/// Remove every notification addressed to `user`. Part of the user
/// deletion cascade.
pub async fn delete_for_user(db: &Database, user: ObjectId) -> AppResult<u64> {
    let result = collection(db)
        .delete_many(doc! { "user": user }, None)
        .await?;
    Ok(result.deleted_count)
}
