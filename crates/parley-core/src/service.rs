//! Orchestrates conversation turns across storage and the assistant.

use crate::{AssistantGateway, ConversationRepository, ParleyError, Result};
use chrono::Utc;
use parley_types::{Conversation, Message, MessageRole, NewConversation, TurnOutcome};
use std::sync::Arc;
use tracing::{info, warn};

/// Longest title taken verbatim from a first message, in characters.
pub const TITLE_MAX_CHARS: usize = 50;

const NEW_CONVERSATION_TITLE: &str = "New Conversation";

/// Title for a conversation derived from its first user message.
pub fn derive_title(message: &str) -> String {
    match message.char_indices().nth(TITLE_MAX_CHARS) {
        Some((cut, _)) => format!("{}...", &message[..cut]),
        None => message.to_string(),
    }
}

pub struct ConversationService {
    repository: ConversationRepository,
    gateway: Arc<dyn AssistantGateway>,
}

impl ConversationService {
    pub fn new(repository: ConversationRepository, gateway: Arc<dyn AssistantGateway>) -> Self {
        Self {
            repository,
            gateway,
        }
    }

    pub fn repository(&self) -> &ConversationRepository {
        &self.repository
    }

    /// Allocate a remote thread and record a conversation for it.
    pub async fn start_conversation(&self) -> Result<NewConversation> {
        let thread_id = self.gateway.create_thread().await?;
        let conversation_id = self
            .repository
            .create(&thread_id, Some(NEW_CONVERSATION_TITLE))?;

        info!(
            target: "parley::turn",
            "Started conversation {} on {} thread {}",
            conversation_id,
            self.gateway.name(),
            thread_id
        );

        Ok(NewConversation {
            conversation_id,
            thread_id,
        })
    }

    /// Run one turn: store the user message, ask the assistant, store the reply.
    ///
    /// Assistant failures do not fail the turn. The reply becomes `Error: <reason>`
    /// so every user message keeps a paired assistant message.
    ///
    /// Turns on one conversation are not serialized. Two concurrent first turns
    /// can both see more than one message, leaving the default title in place.
    pub async fn send_turn(&self, conversation_id: i64, user_message: &str) -> Result<TurnOutcome> {
        let user_message = user_message.trim();
        if user_message.is_empty() {
            return Err(ParleyError::Validation(
                "message must not be empty".to_string(),
            ));
        }

        let conversation = self
            .repository
            .find_by_id(conversation_id)?
            .ok_or(ParleyError::ConversationNotFound(conversation_id))?;

        self.repository
            .append_message(conversation_id, MessageRole::User, user_message)?;

        if self.repository.count_messages(conversation_id)? == 1 {
            self.repository
                .set_title(conversation_id, &derive_title(user_message))?;
        }

        let ai_response = match self
            .gateway
            .ask(&conversation.thread_id, user_message)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(
                    target: "parley::turn",
                    "Assistant failed for conversation {}: {}", conversation_id, e
                );
                format!("Error: {}", e)
            }
        };

        self.repository
            .append_message(conversation_id, MessageRole::Assistant, &ai_response)?;

        Ok(TurnOutcome {
            user_message: user_message.to_string(),
            ai_response,
            timestamp: Utc::now(),
        })
    }

    pub fn list_conversations(&self) -> Result<Vec<Conversation>> {
        self.repository.list_all()
    }

    pub fn messages(&self, conversation_id: i64) -> Result<Vec<Message>> {
        self.repository.list_messages(conversation_id)
    }

    pub fn delete_conversation(&self, conversation_id: i64) -> Result<bool> {
        let removed = self.repository.delete(conversation_id)?;
        if removed {
            info!(target: "parley::turn", "Deleted conversation {}", conversation_id);
        }
        Ok(removed)
    }
}
