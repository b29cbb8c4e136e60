//! Error types for Parley.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParleyError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Conversation not found: {0}")]
    ConversationNotFound(i64),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Assistant service error: {0}")]
    Gateway(String),

    #[error("Run {run_id} did not finish within {waited_secs}s")]
    RunTimeout { run_id: String, waited_secs: u64 },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ParleyError {
    /// True when the failure came from the remote assistant rather than local storage.
    pub fn is_gateway(&self) -> bool {
        matches!(
            self,
            ParleyError::Gateway(_) | ParleyError::RunTimeout { .. } | ParleyError::Http(_)
        )
    }
}
