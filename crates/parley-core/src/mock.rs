//! Offline assistant used for local development and tests.

use crate::{AssistantGateway, Result};
use async_trait::async_trait;
use uuid::Uuid;

/// Deterministic assistant that echoes the user's message back.
#[derive(Debug, Clone, Default)]
pub struct MockAssistant;

impl MockAssistant {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AssistantGateway for MockAssistant {
    async fn create_thread(&self) -> Result<String> {
        Ok(format!("thread_mock_{}", Uuid::new_v4().simple()))
    }

    async fn ask(&self, thread_id: &str, message: &str) -> Result<String> {
        tracing::debug!(target: "parley::gateway", "Mock assistant answering on {}", thread_id);
        Ok(format!("Mock reply to: {}", message))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
