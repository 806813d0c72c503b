pub mod conversation_repo;
pub mod notification_repo;
pub mod post_repo;
pub mod user_repo;

use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Client, Database, IndexModel};

use crate::config::DatabaseConfig;
use crate::error::AppResult;
use crate::models::User;

pub const USERS: &str = "users";
pub const POSTS: &str = "posts";
pub const CONVERSATIONS: &str = "conversations";
pub const NOTIFICATIONS: &str = "notifications";

/// Connect to MongoDB and return a handle to the configured database.
pub async fn connect(config: &DatabaseConfig) -> AppResult<Database> {
    let client = Client::with_uri_str(&config.uri).await?;
    Ok(client.database(&config.name))
}

/// Create the unique indexes the data model relies on. Email and
/// username uniqueness is enforced here, not in application logic.
pub async fn ensure_indexes(db: &Database) -> AppResult<()> {
    let users = db.collection::<User>(USERS);

    for field in ["email", "username"] {
        let index = IndexModel::builder()
            .keys(doc! { field: 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name(format!("unique_{field}"))
                    .build(),
            )
            .build();
        users.create_index(index, None).await?;
    }

    Ok(())
}
