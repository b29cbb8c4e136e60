//! Results of conversation-level operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A freshly started conversation and the remote thread behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewConversation {
    pub conversation_id: i64,
    pub thread_id: String,
}

/// Summary of one completed turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    pub user_message: String,
    /// Assistant reply, or an `Error: ...` string when the gateway failed.
    pub ai_response: String,
    /// Captured when the turn finished, not the stored message time.
    pub timestamp: DateTime<Utc>,
}
