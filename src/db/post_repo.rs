use futures_util::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, to_bson, Bson};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{Collection, Database};

use crate::error::{AppError, AppResult};
use crate::models::{Comment, Post};

fn collection(db: &Database) -> Collection<Post> {
    db.collection::<Post>(super::POSTS)
}

pub async fn insert(db: &Database, post: &Post) -> AppResult<()> {
    collection(db).insert_one(post, None).await?;
    Ok(())
}

pub async fn find_by_id(db: &Database, id: ObjectId) -> AppResult<Option<Post>> {
    Ok(collection(db).find_one(doc! { "_id": id }, None).await?)
}

/// Feed query: newest first, skip/limit paginated.
pub async fn list(db: &Database, limit: i64, skip: u64) -> AppResult<Vec<Post>> {
    let options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .skip(skip)
        .limit(limit)
        .build();
    let cursor = collection(db).find(doc! {}, options).await?;
    Ok(cursor.try_collect().await?)
}

/// Persist the full likes list after an in-memory toggle, mirroring the
/// read-modify-write the data model assumes (no concurrency discipline).
pub async fn set_likes(
    db: &Database,
    id: ObjectId,
    likes: &[ObjectId],
) -> AppResult<Option<Post>> {
    let like_list: Vec<Bson> = likes.iter().map(|id| Bson::ObjectId(*id)).collect();
    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();
    Ok(collection(db)
        .find_one_and_update(
            doc! { "_id": id },
            doc! { "$set": { "likes": like_list } },
            options,
        )
        .await?)
}

/// Append a comment and return the updated post.
pub async fn push_comment(
    db: &Database,
    id: ObjectId,
    comment: &Comment,
) -> AppResult<Option<Post>> {
    let comment_bson = to_bson(comment)
        .map_err(|e| AppError::Internal(format!("failed to encode comment: {e}")))?;
    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();
    Ok(collection(db)
        .find_one_and_update(
            doc! { "_id": id },
            doc! { "$push": { "comments": comment_bson } },
            options,
        )
        .await?)
}

/// Remove every post authored by `author`. Part of the (deliberately
/// incomplete) user-deletion cascade.
pub async fn delete_by_author(db: &Database, author: ObjectId) -> AppResult<u64> {
    let result = collection(db)
        .delete_many(doc! { "author": author }, None)
        .await?;
    Ok(result.deleted_count)
}
