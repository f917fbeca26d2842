//! Entry flow: which screen the app shows.
//!
//! `LoadingAuth → Unauthenticated → (AwaitingApiKey) → Chatting`
//!
//! The api-key step only exists when the flow is built with
//! `require_api_key`. The key lives in this struct and nowhere else.

use chat_types::session::AuthSession;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryState {
    LoadingAuth,
    Unauthenticated,
    AwaitingApiKey,
    Chatting { user_id: String },
}

#[derive(Debug, Clone)]
pub struct EntryFlow {
    state: EntryState,
    require_api_key: bool,
    api_key: Option<String>,
    pending_user: Option<String>,
}

impl EntryFlow {
    pub fn new(require_api_key: bool) -> Self {
        Self {
            state: EntryState::LoadingAuth,
            require_api_key,
            api_key: None,
            pending_user: None,
        }
    }

    pub fn state(&self) -> &EntryState {
        &self.state
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// The user whose chat is showing, if any.
    pub fn chatting_user(&self) -> Option<&str> {
        match &self.state {
            EntryState::Chatting { user_id } => Some(user_id),
            _ => None,
        }
    }

    /// Session detection finished (initial restore, sign-in, or sign-up).
    pub fn session_resolved(&mut self, session: Option<&AuthSession>) {
        self.state = match session {
            None => {
                self.pending_user = None;
                EntryState::Unauthenticated
            }
            Some(s) if self.require_api_key && self.api_key.is_none() => {
                self.pending_user = Some(s.user_id().to_string());
                EntryState::AwaitingApiKey
            }
            Some(s) => EntryState::Chatting {
                user_id: s.user_id().to_string(),
            },
        };
    }

    /// Accept a non-empty key while waiting for one.
    pub fn submit_api_key(&mut self, key: &str) -> bool {
        let key = key.trim();
        if self.state != EntryState::AwaitingApiKey || key.is_empty() {
            return false;
        }
        let Some(user_id) = self.pending_user.take() else {
            return false;
        };
        self.api_key = Some(key.to_string());
        self.state = EntryState::Chatting { user_id };
        true
    }

    pub fn signed_out(&mut self) {
        self.api_key = None;
        self.pending_user = None;
        self.state = EntryState::Unauthenticated;
    }
}
