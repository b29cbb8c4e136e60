//! Seam between conversations and the remote assistant service.

use crate::Result;
use async_trait::async_trait;

/// Reply stored when a run finishes without a new assistant message on the thread.
pub const NO_REPLY_FOUND: &str = "(no assistant reply found)";

/// One synchronous round trip to a hosted assistant per call.
#[async_trait]
pub trait AssistantGateway: Send + Sync {
    /// Allocate a new remote thread and return its identifier.
    async fn create_thread(&self) -> Result<String>;

    /// Post `message` to the thread, run the assistant to a terminal state and
    /// return the latest assistant reply.
    ///
    /// Returns [`NO_REPLY_FOUND`] when the newest thread message is not from the
    /// assistant. Transport and API failures come back as `Err`; the caller decides
    /// how to present them.
    async fn ask(&self, thread_id: &str, message: &str) -> Result<String>;

    /// Short provider name for logging.
    fn name(&self) -> &str;
}
