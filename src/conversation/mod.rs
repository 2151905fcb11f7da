//! Bounded, persisted conversation history.
//!
//! The history always starts with the system persona message. User and
//! assistant messages follow in pairs; once more than `max_exchanges` pairs
//! are held the oldest pair after the persona is dropped.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::storage::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Storage key of the persisted conversation
pub const CONVERSATION_KEY: &str = "picksy_conversation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

pub struct ConversationHistory {
    messages: Vec<Message>,
    persona: String,
    max_exchanges: usize,
    store: Arc<dyn KeyValueStore>,
}

impl ConversationHistory {
    /// Fresh history holding only the persona message.
    pub fn new(persona: impl Into<String>, max_exchanges: usize, store: Arc<dyn KeyValueStore>) -> Self {
        let mut history = Self {
            messages: Vec::new(),
            persona: persona.into(),
            max_exchanges,
            store,
        };
        history.reset();
        history
    }

    /// Restore the persisted conversation, falling back to a fresh one when
    /// nothing usable is stored. The configured persona always replaces the
    /// stored system message, and the stored tail is re-trimmed to the
    /// current limit.
    pub fn load(persona: impl Into<String>, max_exchanges: usize, store: Arc<dyn KeyValueStore>) -> Self {
        let persona = persona.into();
        let stored = match store.get(CONVERSATION_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<Vec<Message>>(&raw)
                .map_err(|e| warn!("Ignoring unreadable conversation: {}", e))
                .ok(),
            Ok(None) => None,
            Err(e) => {
                warn!("Conversation read error: {}", e);
                None
            }
        };

        match stored {
            Some(mut messages) if Self::is_well_formed(&messages) => {
                messages[0] = Message::system(persona.clone());
                let mut history = Self {
                    messages,
                    persona,
                    max_exchanges,
                    store,
                };
                history.trim();
                debug!("Restored conversation with {} exchanges", history.exchange_count());
                history
            }
            _ => Self::new(persona, max_exchanges, store),
        }
    }

    /// Drop everything but a fresh persona message.
    pub fn reset(&mut self) {
        self.messages = vec![Message::system(self.persona.clone())];
        self.persist();
        debug!("Conversation reset");
    }

    /// Record one exchange, evicting the oldest exchanges beyond the limit.
    pub fn append(&mut self, user_text: impl Into<String>, assistant_text: impl Into<String>) {
        self.messages.push(Message::user(user_text));
        self.messages.push(Message::assistant(assistant_text));
        self.trim();
        self.persist();
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of user/assistant pairs after the persona message
    pub fn exchange_count(&self) -> usize {
        self.messages.len().saturating_sub(1) / 2
    }

    pub fn max_exchanges(&self) -> usize {
        self.max_exchanges
    }

    fn trim(&mut self) {
        while self.exchange_count() > self.max_exchanges {
            // Index 0 is the persona
            self.messages.drain(1..3);
        }
    }

    fn persist(&self) {
        let raw = match serde_json::to_string(&self.messages) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Conversation save error: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(CONVERSATION_KEY, &raw) {
            warn!("Conversation save error: {}", e);
        }
    }

    /// Persona first, then strictly alternating user/assistant pairs
    fn is_well_formed(messages: &[Message]) -> bool {
        let Some((first, rest)) = messages.split_first() else {
            return false;
        };
        first.role == Role::System
            && rest.len() % 2 == 0
            && rest
                .chunks(2)
                .all(|pair| pair[0].role == Role::User && pair[1].role == Role::Assistant)
    }
}
