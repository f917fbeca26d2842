//! Port traits — the hexagonal architecture boundary.
//!
//! These traits are defined here in `chat-core` (pure Rust).
//! Implementations live in `chat-platform` (browser adapters).
//! The core never imports platform code; it only depends on these traits.

use async_trait::async_trait;
use chrono::Utc;
use futures::channel::mpsc;
use chat_types::{
    Result,
    message::{ChatMessage, NewMessage},
    session::AuthSession,
};

// ─── Auth Port ───────────────────────────────────────────────

#[async_trait(?Send)]
pub trait AuthPort {
    /// The session currently held in memory, if any
    fn current_session(&self) -> Option<AuthSession>;

    /// A session that is safe to send: the current one if it has not
    /// expired, otherwise whatever a refresh yields.
    ///
    /// Adapters that cannot refresh keep this default, which treats an
    /// expired session as no session.
    async fn active_session(&self) -> Option<AuthSession> {
        self.current_session().filter(|s| !s.is_expired(Utc::now()))
    }

    /// Load a persisted session, refreshing it when expired
    async fn restore(&self) -> Result<Option<AuthSession>>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession>;

    /// Returns `None` when the account awaits email confirmation
    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<AuthSession>>;

    /// Forget the session locally, even if the server call fails
    async fn sign_out(&self) -> Result<()>;
}

// ─── Message Store Port ──────────────────────────────────────

#[async_trait(?Send)]
pub trait MessageStorePort {
    /// All rows owned by `user_id`, oldest first
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<ChatMessage>>;

    /// Insert one row and return it as stored
    async fn insert(&self, message: NewMessage) -> Result<ChatMessage>;

    /// Delete every row owned by `user_id`
    async fn delete_for_user(&self, user_id: &str) -> Result<()>;

    /// Name of this backend (for logging/debug)
    fn backend_name(&self) -> &str;
}

// ─── Realtime Port ───────────────────────────────────────────

/// Which inserts a push subscription should deliver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertFilter {
    pub schema: String,
    pub table: String,
    pub user_id: String,
}

impl InsertFilter {
    pub fn for_user(table: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            schema: "public".to_string(),
            table: table.into(),
            user_id: user_id.into(),
        }
    }

    /// Server-side filter expression, e.g. `user_id=eq.abc`
    pub fn expression(&self) -> String {
        format!("user_id=eq.{}", self.user_id)
    }

    pub fn matches(&self, row: &ChatMessage) -> bool {
        row.user_id == self.user_id
    }
}

/// Tears down the standing connection behind a feed.
pub trait ChannelRelease {
    fn release(&mut self);
}

/// A live push subscription: delivered rows plus the handle that ends it
pub struct RealtimeFeed {
    pub topic: String,
    pub rows: mpsc::UnboundedReceiver<ChatMessage>,
    pub release: Box<dyn ChannelRelease>,
}

pub trait RealtimePort {
    /// Open a standing channel delivering rows inserted under `filter`
    fn subscribe_inserts(&self, filter: InsertFilter) -> Result<RealtimeFeed>;
}

// ─── Generation Port ─────────────────────────────────────────

/// Request forwarded to the generation proxy
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub message: String,
    /// Data URL or https URL of an attached image
    pub image: Option<String>,
    pub access_token: String,
}

#[async_trait(?Send)]
pub trait GenerationPort {
    /// Return the generated text for one message
    async fn generate(&self, req: GenerateRequest) -> Result<String>;
}

// ─── Storage Port ────────────────────────────────────────────

#[async_trait(?Send)]
pub trait StoragePort {
    /// Get a value by key
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Set a value
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Delete a value
    async fn delete(&self, key: &str) -> Result<()>;

    /// Name of this backend (for logging/debug)
    fn backend_name(&self) -> &str;
}
