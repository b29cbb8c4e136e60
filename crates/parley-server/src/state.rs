//! Shared application state.

use crate::config::{Config, Provider};
use anyhow::Result;
use parley_core::{
    AssistantGateway, ConversationRepository, ConversationService, Database, MockAssistant,
    OpenAiAssistant,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub conversations: ConversationService,
    pub config: Config,
}

impl AppState {
    /// Build state with the assistant backend chosen by the config.
    pub fn new(config: Config) -> Result<Self> {
        let gateway: Arc<dyn AssistantGateway> = match config.assistant.provider {
            Provider::Openai => Arc::new(OpenAiAssistant::new(config.assistant.openai_config()?)?),
            Provider::Mock => Arc::new(MockAssistant::new()),
        };
        Self::with_gateway(config, gateway)
    }

    pub fn with_gateway(config: Config, gateway: Arc<dyn AssistantGateway>) -> Result<Self> {
        let db = Database::open(&config.db_path)?;
        let conversations = ConversationService::new(ConversationRepository::new(db), gateway);

        Ok(Self {
            conversations,
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssistantSettings;
    use tempfile::TempDir;

    fn config_for(provider: Provider, dir: &TempDir) -> Config {
        Config {
            db_path: dir.path().join("state.db"),
            assistant: AssistantSettings {
                provider,
                assistant_id: "asst_123".to_string(),
                api_key: None,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_mock_provider_needs_no_key() {
        let dir = TempDir::new().unwrap();

        let state = AppState::new(config_for(Provider::Mock, &dir)).unwrap();

        assert!(state.conversations.list_conversations().unwrap().is_empty());
        assert!(dir.path().join("state.db").exists());
    }

    #[test]
    fn test_openai_provider_without_key_fails() {
        let dir = TempDir::new().unwrap();

        let err = AppState::new(config_for(Provider::Openai, &dir))
            .err()
            .unwrap();

        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }
}
