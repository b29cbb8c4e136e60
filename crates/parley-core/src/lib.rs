//! Conversation storage and assistant relay for Parley.

mod db;
mod error;
mod gateway;
mod mock;
mod openai;
mod repository;
mod service;

pub use db::Database;
pub use error::ParleyError;
pub use gateway::{AssistantGateway, NO_REPLY_FOUND};
pub use mock::MockAssistant;
pub use openai::{OpenAiAssistant, OpenAiConfig};
pub use repository::ConversationRepository;
pub use service::{derive_title, ConversationService, TITLE_MAX_CHARS};

/// Result type for Parley operations.
pub type Result<T> = std::result::Result<T, ParleyError>;
