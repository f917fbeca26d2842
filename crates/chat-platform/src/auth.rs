//! Email/password auth against the hosted GoTrue service.
//!
//! The active session lives in memory and is mirrored to `StoragePort`
//! so a page reload can restore it.

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use gloo_net::http::Request;
use serde::Deserialize;
use serde_json::{json, Value};

use chat_core::ports::{AuthPort, StoragePort};
use chat_types::{
    ChatError, Result,
    config::ChatConfig,
    session::{AuthSession, AuthUser},
};
use crate::http::{extract_error_message, is_success, network_error, CONTENT_TYPE_JSON};

pub(crate) const SESSION_STORAGE_KEY: &str = "chat:auth-session";

pub struct GoTrueAuth {
    config: ChatConfig,
    storage: Rc<dyn StoragePort>,
    session: RefCell<Option<AuthSession>>,
}

impl GoTrueAuth {
    pub fn new(config: ChatConfig, storage: Rc<dyn StoragePort>) -> Self {
        Self {
            config,
            storage,
            session: RefCell::new(None),
        }
    }

    async fn post(&self, path: &str, bearer: Option<&str>, body: Option<Value>) -> Result<(u16, String)> {
        let url = self.config.auth_url(path);
        let mut builder = Request::post(&url)
            .header("apikey", &self.config.anon_key)
            .header("Content-Type", CONTENT_TYPE_JSON);
        if let Some(token) = bearer {
            builder = builder.header("Authorization", &chat_types::session::bearer(token));
        }

        let response = match body {
            Some(body) => builder.json(&body).map_err(network_error)?.send().await,
            None => builder.send().await,
        }
        .map_err(network_error)?;

        let status = response.status();
        let text = response.text().await.map_err(network_error)?;
        Ok((status, text))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession> {
        let (status, body) = self
            .post(
                "token?grant_type=refresh_token",
                None,
                Some(json!({ "refresh_token": refresh_token })),
            )
            .await?;
        parse_token_response(status, &body, Utc::now())
    }

    async fn remember(&self, session: Option<AuthSession>) {
        let result = match &session {
            Some(s) => match serde_json::to_vec(s) {
                Ok(bytes) => self.storage.set(SESSION_STORAGE_KEY, &bytes).await,
                Err(e) => Err(e.into()),
            },
            None => self.storage.delete(SESSION_STORAGE_KEY).await,
        };
        if let Err(e) = result {
            log::warn!("Could not persist session to {}: {}", self.storage.backend_name(), e);
        }
        *self.session.borrow_mut() = session;
    }
}

#[async_trait(?Send)]
impl AuthPort for GoTrueAuth {
    fn current_session(&self) -> Option<AuthSession> {
        self.session.borrow().clone()
    }

    /// Refreshes an expired session in place. A failed refresh forgets the
    /// session unless a concurrent caller already replaced it.
    async fn active_session(&self) -> Option<AuthSession> {
        let current = self.current_session()?;
        if !current.is_expired(Utc::now()) {
            return Some(current);
        }

        match self.refresh(&current.refresh_token).await {
            Ok(fresh) => {
                log::info!("Session refreshed for {}", fresh.user_id());
                self.remember(Some(fresh.clone())).await;
                Some(fresh)
            }
            Err(e) => {
                if let Some(latest) = self.current_session().filter(|s| !s.is_expired(Utc::now())) {
                    return Some(latest);
                }
                log::warn!("Session refresh failed: {}", e);
                self.remember(None).await;
                None
            }
        }
    }

    async fn restore(&self) -> Result<Option<AuthSession>> {
        let Some(bytes) = self.storage.get(SESSION_STORAGE_KEY).await? else {
            return Ok(None);
        };

        let stored: AuthSession = match serde_json::from_slice(&bytes) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("Discarding unreadable stored session: {}", e);
                self.remember(None).await;
                return Ok(None);
            }
        };

        if !stored.is_expired(Utc::now()) {
            *self.session.borrow_mut() = Some(stored.clone());
            return Ok(Some(stored));
        }

        match self.refresh(&stored.refresh_token).await {
            Ok(fresh) => {
                log::info!("Session refreshed for {}", fresh.user_id());
                self.remember(Some(fresh.clone())).await;
                Ok(Some(fresh))
            }
            Err(e) => {
                log::warn!("Session refresh failed: {}", e);
                self.remember(None).await;
                Ok(None)
            }
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let (status, body) = self
            .post(
                "token?grant_type=password",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await?;
        let session = parse_token_response(status, &body, Utc::now())?;
        log::info!("Signed in as {}", session.user_id());
        self.remember(Some(session.clone())).await;
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<AuthSession>> {
        let (status, body) = self
            .post("signup", None, Some(json!({ "email": email, "password": password })))
            .await?;
        let session = parse_signup_response(status, &body, Utc::now())?;
        if session.is_some() {
            self.remember(session.clone()).await;
        }
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        let previous = self.current_session();
        if let Some(session) = previous {
            match self.post("logout", Some(&session.access_token), None).await {
                Ok((status, _)) if is_success(status) => {}
                Ok((status, body)) => {
                    log::warn!("Logout returned {}: {}", status, body);
                }
                Err(e) => log::warn!("Logout request failed: {}", e),
            }
        }
        self.remember(None).await;
        Ok(())
    }
}

// ─── Response parsing ────────────────────────────────────────

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    /// Unix seconds
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> AuthSession {
        let expires_at = self
            .expires_at
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .or_else(|| self.expires_in.map(|secs| now + Duration::seconds(secs)));
        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            token_type: self.token_type.unwrap_or_else(|| "bearer".to_string()),
            expires_at,
            user: self.user,
        }
    }
}

fn auth_failure(status: u16, body: &str) -> ChatError {
    let message = extract_error_message(body)
        .unwrap_or_else(|| format!("Request failed with status {}", status));
    ChatError::Auth(message)
}

/// Decode a `/token` reply into a session.
pub fn parse_token_response(status: u16, body: &str, now: DateTime<Utc>) -> Result<AuthSession> {
    if !is_success(status) {
        return Err(auth_failure(status, body));
    }
    let token: TokenResponse = serde_json::from_str(body)?;
    Ok(token.into_session(now))
}

/// Decode a `/signup` reply. Without auto-confirm the body is just the user.
pub fn parse_signup_response(
    status: u16,
    body: &str,
    now: DateTime<Utc>,
) -> Result<Option<AuthSession>> {
    if !is_success(status) {
        return Err(auth_failure(status, body));
    }
    let value: Value = serde_json::from_str(body)?;
    if value.get("access_token").and_then(Value::as_str).is_none() {
        return Ok(None);
    }
    let token: TokenResponse = serde_json::from_value(value)?;
    Ok(Some(token.into_session(now)))
}
