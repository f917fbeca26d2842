//! Stand-ins used when the build has no backend coordinates.
//!
//! `LocalAuth` signs anyone in with a non-empty email and password and keeps
//! the session in local storage. `OfflineGeneration` answers without a
//! network call. Together with `MemoryBackend` they make the app usable as a
//! local demo.

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;

use chat_core::ports::{AuthPort, GenerateRequest, GenerationPort, StoragePort};
use chat_types::{
    ChatError, Result,
    session::{AuthSession, AuthUser},
};
use crate::auth::SESSION_STORAGE_KEY;

const OFFLINE_TOKEN: &str = "offline";

pub struct LocalAuth {
    storage: Rc<dyn StoragePort>,
    session: RefCell<Option<AuthSession>>,
}

impl LocalAuth {
    pub fn new(storage: Rc<dyn StoragePort>) -> Self {
        Self {
            storage,
            session: RefCell::new(None),
        }
    }

    fn session_for(email: &str) -> AuthSession {
        let email = email.trim().to_lowercase();
        AuthSession {
            access_token: OFFLINE_TOKEN.to_string(),
            refresh_token: String::new(),
            token_type: "bearer".to_string(),
            expires_at: None,
            user: AuthUser {
                id: format!("local:{}", email),
                email: Some(email),
            },
        }
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
            log::warn!("Could not persist local session: {}", e);
        }
        *self.session.borrow_mut() = session;
    }
}

#[async_trait(?Send)]
impl AuthPort for LocalAuth {
    fn current_session(&self) -> Option<AuthSession> {
        self.session.borrow().clone()
    }

    async fn restore(&self) -> Result<Option<AuthSession>> {
        let Some(bytes) = self.storage.get(SESSION_STORAGE_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_slice::<AuthSession>(&bytes) {
            Ok(session) if session.access_token == OFFLINE_TOKEN => {
                *self.session.borrow_mut() = Some(session.clone());
                Ok(Some(session))
            }
            // A hosted session from another build, or garbage.
            _ => {
                self.remember(None).await;
                Ok(None)
            }
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ChatError::Auth("Email and password are required".to_string()));
        }
        let session = Self::session_for(email);
        log::info!("Signed in locally as {}", session.user_id());
        self.remember(Some(session.clone())).await;
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<AuthSession>> {
        self.sign_in(email, password).await.map(Some)
    }

    async fn sign_out(&self) -> Result<()> {
        self.remember(None).await;
        Ok(())
    }
}

/// Replies locally so the chat loop can be exercised without a backend.
pub struct OfflineGeneration;

#[async_trait(?Send)]
impl GenerationPort for OfflineGeneration {
    async fn generate(&self, req: GenerateRequest) -> Result<String> {
        let reply = match (req.message.trim(), req.image.is_some()) {
            ("", true) => "(offline) I received your image, but no AI backend is configured.".to_string(),
            (text, _) => format!("(offline) No AI backend is configured. You said: {}", text),
        };
        Ok(reply)
    }
}
