//! AI client — forwards a user message to the generation proxy.
//!
//! Every request carries the caller's session token; without an unexpired
//! or refreshable session the call fails before anything is sent.

use std::cell::RefCell;
use std::rc::Rc;

use chat_types::{ChatError, Result, event::ChatEvent};
use crate::event_bus::EventBus;
use crate::ports::{AuthPort, GenerateRequest, GenerationPort};

#[derive(Debug, Default)]
struct AssistantState {
    busy: bool,
    last_error: Option<String>,
}

#[derive(Clone)]
pub struct AssistantClient {
    auth: Rc<dyn AuthPort>,
    generation: Rc<dyn GenerationPort>,
    events: EventBus,
    state: Rc<RefCell<AssistantState>>,
}

impl AssistantClient {
    pub fn new(
        auth: Rc<dyn AuthPort>,
        generation: Rc<dyn GenerationPort>,
        events: EventBus,
    ) -> Self {
        Self {
            auth,
            generation,
            events,
            state: Rc::new(RefCell::new(AssistantState::default())),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.state.borrow().busy
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.borrow().last_error.clone()
    }

    /// Send `text` (and an optional image) and return the generated reply.
    ///
    /// Overlapping calls are not serialized: each one clears the busy flag
    /// when it finishes, and the last to finish decides `last_error`.
    pub async fn send_message(&self, text: &str, image: Option<String>) -> Result<String> {
        {
            let mut state = self.state.borrow_mut();
            state.busy = true;
            state.last_error = None;
        }
        self.events.emit(ChatEvent::ReplyStarted);

        let result = self.request(text, image).await;

        let error = result.as_ref().err().map(ToString::to_string);
        if let Some(message) = &error {
            log::warn!("Generation failed: {}", message);
        }
        {
            let mut state = self.state.borrow_mut();
            state.busy = false;
            state.last_error = error.clone();
        }
        self.events.emit(ChatEvent::ReplyFinished { error });
        result
    }

    async fn request(&self, text: &str, image: Option<String>) -> Result<String> {
        let session = self
            .auth
            .active_session()
            .await
            .ok_or_else(ChatError::not_signed_in)?;

        let reply = self
            .generation
            .generate(GenerateRequest {
                message: text.to_string(),
                image,
                access_token: session.access_token,
            })
            .await?;

        if reply.trim().is_empty() {
            return Err(ChatError::no_response());
        }
        Ok(reply)
    }
}
