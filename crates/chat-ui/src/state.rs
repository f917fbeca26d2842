//! UI-level state that drives rendering.
//! Form fields live here; chat data stays in the core stores and is read
//! each frame. Bus events are folded in by `process_events`.

use chat_types::event::{ChatEvent, Toast};

/// Seconds a toast stays on screen
pub const TOAST_SECONDS: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    SignIn,
    SignUp,
}

impl AuthMode {
    pub fn title(&self) -> &'static str {
        match self {
            AuthMode::SignIn => "Sign In",
            AuthMode::SignUp => "Sign Up",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            AuthMode::SignIn => AuthMode::SignUp,
            AuthMode::SignUp => AuthMode::SignIn,
        }
    }
}

/// A toast with the time (egui seconds) it disappears
#[derive(Debug, Clone, PartialEq)]
pub struct ToastEntry {
    pub toast: Toast,
    pub expires_at: f64,
}

/// State visible to UI panels
pub struct UiState {
    /// Message input
    pub input_text: String,
    /// Optional image URL sent along with the message
    pub image_url: String,
    pub email: String,
    pub password: String,
    pub auth_mode: AuthMode,
    /// Set while a sign-in/sign-up request is in flight
    pub auth_pending: bool,
    pub api_key_input: String,
    pub toasts: Vec<ToastEntry>,
    /// Set between `ReplyStarted` and `ReplyFinished`
    pub replying: bool,
    /// Status line text
    pub status_text: String,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            input_text: String::new(),
            image_url: String::new(),
            email: String::new(),
            password: String::new(),
            auth_mode: AuthMode::SignIn,
            auth_pending: false,
            api_key_input: String::new(),
            toasts: Vec::new(),
            replying: false,
            status_text: "Ready".to_string(),
        }
    }

    /// Process events from the EventBus and update UI state.
    /// `now` is the egui clock in seconds.
    pub fn process_events(&mut self, events: Vec<ChatEvent>, now: f64) {
        for event in events {
            match event {
                ChatEvent::Toast(toast) => self.push_toast(toast, now),
                ChatEvent::ReplyStarted => {
                    self.replying = true;
                    self.status_text = "Thinking...".to_string();
                }
                ChatEvent::ReplyFinished { error } => {
                    self.replying = false;
                    self.status_text = match error {
                        Some(message) => format!("Error: {}", message),
                        None => "Ready".to_string(),
                    };
                }
                ChatEvent::HistoryChanged { len } => {
                    log::debug!("History now holds {} messages", len);
                }
            }
        }
    }

    pub fn push_toast(&mut self, toast: Toast, now: f64) {
        self.toasts.push(ToastEntry {
            toast,
            expires_at: now + TOAST_SECONDS,
        });
    }

    /// Drop expired toasts; returns true if any remain.
    pub fn expire_toasts(&mut self, now: f64) -> bool {
        self.toasts.retain(|t| t.expires_at > now);
        !self.toasts.is_empty()
    }

    pub fn dismiss_toast(&mut self, index: usize) {
        if index < self.toasts.len() {
            self.toasts.remove(index);
        }
    }

    /// Take the composed message, clearing the inputs.
    ///
    /// Returns `None` (and keeps the inputs) when both text and image are
    /// blank.
    pub fn take_submission(&mut self) -> Option<(String, Option<String>)> {
        let text = self.input_text.trim().to_string();
        let image = self.image_url.trim().to_string();
        if text.is_empty() && image.is_empty() {
            return None;
        }
        self.input_text.clear();
        self.image_url.clear();
        Some((text, (!image.is_empty()).then_some(image)))
    }

    /// Email and password when both are filled in.
    pub fn credentials(&self) -> Option<(String, String)> {
        let email = self.email.trim();
        if email.is_empty() || self.password.is_empty() {
            return None;
        }
        Some((email.to_string(), self.password.clone()))
    }

    /// Reset everything tied to the signed-in user.
    pub fn reset_for_sign_out(&mut self) {
        self.input_text.clear();
        self.image_url.clear();
        self.password.clear();
        self.api_key_input.clear();
        self.replying = false;
        self.status_text = "Ready".to_string();
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}
