//! Generation client for the first-party proxy function.
//!
//! The proxy holds the third-party AI credentials; the browser only sends
//! the user's session token. Uses browser `fetch()` via gloo-net.

use async_trait::async_trait;
use gloo_net::http::Request;
use serde::{Deserialize, Serialize};

use chat_core::ports::{GenerateRequest, GenerationPort};
use chat_types::{ChatError, Result, config::ChatConfig, session::bearer};
use crate::http::{is_success, network_error, CONTENT_TYPE_JSON};

pub struct ProxyGenerationClient {
    url: String,
    anon_key: String,
}

impl ProxyGenerationClient {
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            url: config.function_url(),
            anon_key: config.anon_key.clone(),
        }
    }
}

#[async_trait(?Send)]
impl GenerationPort for ProxyGenerationClient {
    async fn generate(&self, req: GenerateRequest) -> Result<String> {
        let body = ProxyRequest {
            message: &req.message,
            image: req.image.as_deref(),
        };

        let response = Request::post(&self.url)
            .header("Content-Type", CONTENT_TYPE_JSON)
            .header("Authorization", &bearer(&req.access_token))
            .header("apikey", &self.anon_key)
            .json(&body)
            .map_err(network_error)?
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        let text = response.text().await.map_err(network_error)?;
        interpret_proxy_response(status, &text)
    }
}

#[derive(Serialize)]
struct ProxyRequest<'a> {
    message: &'a str,
    image: Option<&'a str>,
}

#[derive(Deserialize, Default)]
struct ProxyResponse {
    #[serde(rename = "generatedText", default)]
    generated_text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Map a proxy reply to the generated text or a typed failure.
pub fn interpret_proxy_response(status: u16, body: &str) -> Result<String> {
    let parsed = serde_json::from_str::<ProxyResponse>(body);

    if !is_success(status) {
        let message = parsed.ok().and_then(|r| r.error);
        return Err(ChatError::server(status, message));
    }

    let parsed = parsed.map_err(|_| ChatError::no_response())?;
    match parsed.generated_text.filter(|t| !t.trim().is_empty()) {
        Some(text) => Ok(text),
        None => match parsed.error {
            Some(message) => Err(ChatError::server(status, Some(message))),
            None => Err(ChatError::no_response()),
        },
    }
}
