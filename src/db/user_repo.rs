use std::collections::HashMap;

use futures_util::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use mongodb::{Collection, Database};

use crate::error::{is_duplicate_key, AppError, AppResult};
use crate::models::User;

fn collection(db: &Database) -> Collection<User> {
    db.collection::<User>(super::USERS)
}

/// Insert a new user; a unique-index violation maps to `Conflict`.
pub async fn insert(db: &Database, user: &User) -> AppResult<()> {
    collection(db).insert_one(user, None).await.map_err(|e| {
        if is_duplicate_key(&e) {
            AppError::Conflict("A user with that email or username already exists".to_string())
        } else {
            AppError::Database(e)
        }
    })?;
    Ok(())
}

pub async fn find_by_id(db: &Database, id: ObjectId) -> AppResult<Option<User>> {
    Ok(collection(db).find_one(doc! { "_id": id }, None).await?)
}

pub async fn find_by_email(db: &Database, email: &str) -> AppResult<Option<User>> {
    Ok(collection(db)
        .find_one(doc! { "email": email }, None)
        .await?)
}

/// Fetch a batch of users keyed by id, for query-time joins.
pub async fn find_map_by_ids(
    db: &Database,
    ids: &[ObjectId],
) -> AppResult<HashMap<ObjectId, User>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let id_list: Vec<Bson> = ids.iter().map(|id| Bson::ObjectId(*id)).collect();
    let cursor = collection(db)
        .find(doc! { "_id": { "$in": id_list } }, None)
        .await?;
    let users: Vec<User> = cursor.try_collect().await?;

    Ok(users.into_iter().map(|u| (u.id, u)).collect())
}

/// Case-insensitive username substring search, excluding the caller.
pub async fn search_by_username(
    db: &Database,
    fragment: &str,
    exclude: ObjectId,
) -> AppResult<Vec<User>> {
    let cursor = collection(db)
        .find(
            doc! {
                "username": { "$regex": fragment, "$options": "i" },
                "_id": { "$ne": exclude },
            },
            None,
        )
        .await?;
    Ok(cursor.try_collect().await?)
}

/// Apply a partial `$set` update and return the updated document.
pub async fn update_profile(
    db: &Database,
    id: ObjectId,
    updates: Document,
) -> AppResult<Option<User>> {
    if updates.is_empty() {
        return find_by_id(db, id).await;
    }

    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();
    collection(db)
        .find_one_and_update(doc! { "_id": id }, doc! { "$set": updates }, options)
        .await
        .map_err(|e| {
            if is_duplicate_key(&e) {
                AppError::Conflict(
                    "A user with that email or username already exists".to_string(),
                )
            } else {
                AppError::Database(e)
            }
        })
}

/// Delete the user document. Returns false when no document matched.
pub async fn delete(db: &Database, id: ObjectId) -> AppResult<bool> {
    let result = collection(db).delete_one(doc! { "_id": id }, None).await?;
    Ok(result.deleted_count > 0)
}
