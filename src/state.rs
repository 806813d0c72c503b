use std::sync::Arc;

use mongodb::Database;

use crate::config::Config;
use crate::services::storage::MediaStorage;
use crate::websocket::ConnectionRegistry;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub registry: ConnectionRegistry,
    pub config: Arc<Config>,
    pub storage: Arc<MediaStorage>,
}
