pub mod api;
pub mod chat;
pub mod config;
pub mod errors;
pub mod models;
pub mod upload;
pub mod view;

pub use api::{ContextResetter, DocumentQaClient, DocumentStore, QueryService, UploadReceipt};
pub use chat::{ChatController, ChatSession, Exchange, FALLBACK_REPLY};
pub use config::ClientConfig;
pub use errors::AppError;
pub use models::{Message, MessageRole, StagedFile};
pub use upload::{UploadController, UploadOutcome};
