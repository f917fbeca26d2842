//! Row CRUD for the `messages` table over the hosted PostgREST API.
//!
//! Filtering and ordering happen server-side; row-level security scopes
//! every request to the bearer token's user.

use std::rc::Rc;

use async_trait::async_trait;
use gloo_net::http::{Request, RequestBuilder, Response};

use chat_core::ports::{AuthPort, MessageStorePort};
use chat_types::{
    ChatError, Result,
    config::ChatConfig,
    message::{ChatMessage, NewMessage},
    session::bearer,
};
use crate::http::{extract_error_message, is_success, network_error, CONTENT_TYPE_JSON};

pub struct PostgrestStore {
    config: ChatConfig,
    auth: Rc<dyn AuthPort>,
}

impl PostgrestStore {
    pub fn new(config: ChatConfig, auth: Rc<dyn AuthPort>) -> Self {
        Self { config, auth }
    }

    /// Active session token when signed in, else the anon key.
    async fn with_headers(&self, builder: RequestBuilder) -> RequestBuilder {
        let token = self
            .auth
            .active_session()
            .await
            .map(|s| s.access_token)
            .unwrap_or_else(|| self.config.anon_key.clone());
        builder
            .header("apikey", &self.config.anon_key)
            .header("Authorization", &bearer(&token))
    }
}

#[async_trait(?Send)]
impl MessageStorePort for PostgrestStore {
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<ChatMessage>> {
        let response = self
            .with_headers(Request::get(&list_url(&self.config, user_id)))
            .await
            .send()
            .await
            .map_err(network_error)?;
        let response = ensure_success(response, "select").await?;
        response
            .json::<Vec<ChatMessage>>()
            .await
            .map_err(|e| ChatError::Serialization(e.to_string()))
    }

    async fn insert(&self, message: NewMessage) -> Result<ChatMessage> {
        let response = self
            .with_headers(Request::post(&self.config.rest_url()))
            .await
            .header("Content-Type", CONTENT_TYPE_JSON)
            .header("Prefer", "return=representation")
            .header("Accept", "application/vnd.pgrst.object+json")
            .json(&message)
            .map_err(network_error)?
            .send()
            .await
            .map_err(network_error)?;
        let response = ensure_success(response, "insert").await?;
        response
            .json::<ChatMessage>()
            .await
            .map_err(|e| ChatError::Serialization(e.to_string()))
    }

    async fn delete_for_user(&self, user_id: &str) -> Result<()> {
        let response = self
            .with_headers(Request::delete(&delete_url(&self.config, user_id)))
            .await
            .send()
            .await
            .map_err(network_error)?;
        ensure_success(response, "delete").await?;
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "postgrest"
    }
}

async fn ensure_success(response: Response, op: &str) -> Result<Response> {
    let status = response.status();
    if is_success(status) {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = extract_error_message(&body).unwrap_or(body);
    Err(ChatError::Storage(format!("{} failed (HTTP {}): {}", op, status, detail)))
}

fn user_filter(user_id: &str) -> String {
    format!("user_id=eq.{}", urlencoding::encode(user_id))
}

pub fn list_url(config: &ChatConfig, user_id: &str) -> String {
    format!(
        "{}?select=*&{}&order=created_at.asc",
        config.rest_url(),
        user_filter(user_id)
    )
}

pub fn delete_url(config: &ChatConfig, user_id: &str) -> String {
    format!("{}?{}", config.rest_url(), user_filter(user_id))
}
