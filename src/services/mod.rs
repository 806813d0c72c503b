pub mod chat_service;
pub mod notifier;
pub mod storage;

pub use chat_service::ChatService;
pub use storage::MediaStorage;
