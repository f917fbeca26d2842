use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the `messages` table.
///
/// Field names match the table columns so rows decode straight from
/// PostgREST responses and realtime payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub content: String,
    pub is_ai: bool,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl ChatMessage {
    /// Display order: creation time, then id for rows sharing a timestamp.
    pub fn sort_key(&self) -> (DateTime<Utc>, i64) {
        (self.created_at, self.id)
    }

    pub fn author_label(&self) -> &'static str {
        if self.is_ai { "AI" } else { "You" }
    }
}

/// Insert payload. `id` and `created_at` are assigned by storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMessage {
    pub content: String,
    pub is_ai: bool,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl NewMessage {
    pub fn user(user_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_ai: false,
            user_id: user_id.into(),
            image_url: None,
            conversation_id: None,
            title: None,
        }
    }

    pub fn ai(user_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            is_ai: true,
            ..Self::user(user_id, content)
        }
    }

    pub fn with_image(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url;
        self
    }

    /// Materialize the row storage would produce for this payload.
    pub fn into_row(self, id: i64, created_at: DateTime<Utc>) -> ChatMessage {
        ChatMessage {
            id,
            content: self.content,
            is_ai: self.is_ai,
            created_at,
            user_id: self.user_id,
            image_url: self.image_url,
            conversation_id: self.conversation_id,
            title: self.title,
        }
    }
}
