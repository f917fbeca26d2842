//! One chat turn: persist the user's message, ask the AI, persist the reply.

use chat_types::{Result, event::Toast, message::ChatMessage};
use crate::assistant::AssistantClient;
use crate::event_bus::EventBus;
use crate::history::ChatHistory;

#[derive(Clone)]
pub struct ChatTurn {
    history: ChatHistory,
    assistant: AssistantClient,
    events: EventBus,
}

impl ChatTurn {
    pub fn new(history: ChatHistory, assistant: AssistantClient, events: EventBus) -> Self {
        Self { history, assistant, events }
    }

    /// Run a turn. Returns the stored reply row, or `None` when the input
    /// was empty or the reply could not be saved.
    pub async fn run(&self, text: &str, image: Option<String>) -> Result<Option<ChatMessage>> {
        let text = text.trim();
        let image = image.filter(|i| !i.trim().is_empty());
        if text.is_empty() && image.is_none() {
            return Ok(None);
        }

        self.history.save(text, false, image.clone()).await;

        match self.assistant.send_message(text, image).await {
            Ok(reply) => Ok(self.history.save(&reply, true, None).await),
            Err(e) => {
                self.events.toast(Toast::error(e.to_string()));
                Err(e)
            }
        }
    }
}
