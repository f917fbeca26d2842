use serde::{Deserialize, Serialize};

/// Top-level client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Base URL of the hosted backend, e.g. `https://xyz.supabase.co`
    pub backend_url: String,
    /// Public (anon) key sent as `apikey` on every backend request
    pub anon_key: String,
    /// Name of the proxy function that calls the generation API
    pub generate_function: String,
    pub messages_table: String,
    /// Ask for an API key after sign-in before showing the chat
    pub require_api_key: bool,
    pub realtime_heartbeat_ms: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            backend_url: String::new(),
            anon_key: String::new(),
            generate_function: DEFAULT_GENERATE_FUNCTION.to_string(),
            messages_table: DEFAULT_MESSAGES_TABLE.to_string(),
            require_api_key: false,
            realtime_heartbeat_ms: 25_000,
        }
    }
}

const DEFAULT_GENERATE_FUNCTION: &str = "generate-text";
const DEFAULT_MESSAGES_TABLE: &str = "messages";

impl ChatConfig {
    pub fn new(backend_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into(),
            anon_key: anon_key.into(),
            ..Self::default()
        }
    }

    /// Backend coordinates baked in at build time.
    pub fn from_build_env() -> Self {
        Self::new(
            option_env!("CHAT_BACKEND_URL").unwrap_or_default(),
            option_env!("CHAT_BACKEND_ANON_KEY").unwrap_or_default(),
        )
    }

    pub fn is_configured(&self) -> bool {
        !self.backend_url.trim().is_empty() && !self.anon_key.trim().is_empty()
    }

    fn base(&self) -> &str {
        self.backend_url.trim_end_matches('/')
    }

    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base(), self.messages_table)
    }

    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base(), path.trim_start_matches('/'))
    }

    pub fn function_url(&self) -> String {
        format!("{}/functions/v1/{}", self.base(), self.generate_function)
    }

    /// Realtime websocket endpoint (http scheme swapped for ws).
    pub fn realtime_url(&self) -> String {
        let base = self.base();
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.to_string()
        };
        format!(
            "{}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
            ws_base, self.anon_key
        )
    }
}
