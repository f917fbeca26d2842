//! WASM-target tests for chat-core.
//!
//! Runs EventBus, Subscription, EntryFlow, ChatHistory and
//! AssistantClient tests under wasm32-unknown-unknown via
//! `wasm-pack test --node`.

use wasm_bindgen_test::*;

use chat_core::assistant::AssistantClient;
use chat_core::entry::{EntryFlow, EntryState};
use chat_core::event_bus::EventBus;
use chat_core::history::ChatHistory;
use chat_core::ports::*;
use chat_core::subscription::Subscription;
use chat_types::event::{ChatEvent, Toast};
use chat_types::message::{ChatMessage, NewMessage};
use chat_types::session::{AuthSession, AuthUser};
use chat_types::{ChatError, Result};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use futures::channel::mpsc;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

// ─── Mocks ───────────────────────────────────────────────

struct FlagRelease(Rc<Cell<usize>>);

impl ChannelRelease for FlagRelease {
    fn release(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

/// Store plus feed in one; inserts are pushed to the live feed first.
#[derive(Default)]
struct LoopbackBackend {
    rows: RefCell<Vec<ChatMessage>>,
    feed: RefCell<Option<mpsc::UnboundedSender<ChatMessage>>>,
    releases: Rc<Cell<usize>>,
}

#[async_trait(?Send)]
impl MessageStorePort for LoopbackBackend {
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<ChatMessage>> {
        Ok(self.rows.borrow().iter().filter(|r| r.user_id == user_id).cloned().collect())
    }

    async fn insert(&self, message: NewMessage) -> Result<ChatMessage> {
        let id = self.rows.borrow().len() as i64 + 1;
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap() + Duration::seconds(id);
        let row = message.into_row(id, at);
        self.rows.borrow_mut().push(row.clone());
        if let Some(tx) = self.feed.borrow().as_ref() {
            let _ = tx.unbounded_send(row.clone());
        }
        Ok(row)
    }

    async fn delete_for_user(&self, user_id: &str) -> Result<()> {
        self.rows.borrow_mut().retain(|r| r.user_id != user_id);
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "loopback"
    }
}

impl RealtimePort for LoopbackBackend {
    fn subscribe_inserts(&self, filter: InsertFilter) -> Result<RealtimeFeed> {
        let (tx, rx) = mpsc::unbounded();
        *self.feed.borrow_mut() = Some(tx);
        Ok(RealtimeFeed {
            topic: format!("loopback:{}", filter.expression()),
            rows: rx,
            release: Box::new(FlagRelease(self.releases.clone())),
        })
    }
}

struct FixedAuth(Option<AuthSession>);

#[async_trait(?Send)]
impl AuthPort for FixedAuth {
    fn current_session(&self) -> Option<AuthSession> {
        self.0.clone()
    }

    async fn restore(&self) -> Result<Option<AuthSession>> {
        Ok(self.0.clone())
    }

    async fn sign_in(&self, _email: &str, _password: &str) -> Result<AuthSession> {
        Err(ChatError::Auth("unsupported".to_string()))
    }

    async fn sign_up(&self, _email: &str, _password: &str) -> Result<Option<AuthSession>> {
        Ok(None)
    }

    async fn sign_out(&self) -> Result<()> {
        Ok(())
    }
}

struct EchoGeneration {
    calls: Cell<usize>,
}

#[async_trait(?Send)]
impl GenerationPort for EchoGeneration {
    async fn generate(&self, request: GenerateRequest) -> Result<String> {
        self.calls.set(self.calls.get() + 1);
        Ok(format!("echo: {}", request.message))
    }
}

fn session(user: &str) -> AuthSession {
    AuthSession {
        access_token: "token".to_string(),
        refresh_token: "refresh".to_string(),
        token_type: "bearer".to_string(),
        expires_at: None,
        user: AuthUser { id: user.to_string(), email: None },
    }
}

// ─── EventBus Tests ──────────────────────────────────────

#[wasm_bindgen_test]
fn event_bus_emit_and_drain() {
    let bus = EventBus::new();
    assert!(!bus.has_pending());
    bus.emit(ChatEvent::ReplyStarted);
    bus.toast(Toast::success("Chat history cleared"));
    assert_eq!(bus.drain().len(), 2);
    assert!(bus.drain().is_empty());
}

// ─── Subscription Tests ──────────────────────────────────

#[wasm_bindgen_test]
fn subscription_releases_once() {
    let count = Rc::new(Cell::new(0));
    let (_tx, rx) = mpsc::unbounded();
    let mut sub = Subscription::new(RealtimeFeed {
        topic: "t".to_string(),
        rows: rx,
        release: Box::new(FlagRelease(count.clone())),
    });
    sub.release();
    sub.release();
    drop(sub);
    assert_eq!(count.get(), 1);
}

// ─── EntryFlow Tests ─────────────────────────────────────

#[wasm_bindgen_test]
fn entry_flow_gate_sequence() {
    let mut flow = EntryFlow::new(true);
    assert_eq!(flow.state(), &EntryState::LoadingAuth);
    flow.session_resolved(Some(&session("u")));
    assert_eq!(flow.state(), &EntryState::AwaitingApiKey);
    assert!(!flow.submit_api_key("   "));
    assert!(flow.submit_api_key("sk-1"));
    assert_eq!(flow.chatting_user(), Some("u"));
    flow.signed_out();
    assert_eq!(flow.state(), &EntryState::Unauthenticated);
}

// ─── ChatHistory Tests ───────────────────────────────────

#[wasm_bindgen_test]
async fn history_save_then_push_dedups() {
    let backend = Rc::new(LoopbackBackend::default());
    let history = ChatHistory::new(backend.clone(), backend.clone(), EventBus::new(), "messages");

    history.attach("u").await;
    assert!(!history.is_loading());
    assert!(history.is_subscribed());

    let saved = history.save("hi", false, None).await.unwrap();
    assert_eq!(history.pump(), 0);
    assert_eq!(history.len(), 1);
    assert_eq!(history.messages()[0].id, saved.id);

    history.detach();
    assert_eq!(backend.releases.get(), 1);
    assert!(history.is_empty());
}

#[wasm_bindgen_test]
async fn history_clear_empties_list() {
    let backend = Rc::new(LoopbackBackend::default());
    let bus = EventBus::new();
    let history = ChatHistory::new(backend.clone(), backend.clone(), bus.clone(), "messages");

    history.attach("u").await;
    history.save("one", false, None).await;
    history.clear().await;
    assert!(history.is_empty());

    let toasts: Vec<Toast> = bus
        .drain()
        .into_iter()
        .filter_map(|e| match e {
            ChatEvent::Toast(t) => Some(t),
            _ => None,
        })
        .collect();
    assert!(toasts.iter().any(|t| t.description == "Chat history cleared"));
}

// ─── AssistantClient Tests ───────────────────────────────

#[wasm_bindgen_test]
async fn assistant_requires_session_before_network() {
    let generation = Rc::new(EchoGeneration { calls: Cell::new(0) });
    let client = AssistantClient::new(Rc::new(FixedAuth(None)), generation.clone(), EventBus::new());

    let err = client.send_message("hi", None).await.unwrap_err();
    assert!(matches!(err, ChatError::Auth(_)));
    assert_eq!(generation.calls.get(), 0);
    assert!(!client.is_busy());
}

#[wasm_bindgen_test]
async fn assistant_returns_reply() {
    let generation = Rc::new(EchoGeneration { calls: Cell::new(0) });
    let client = AssistantClient::new(Rc::new(FixedAuth(Some(session("u")))), generation, EventBus::new());

    let reply = client.send_message("ping", None).await.unwrap();
    assert_eq!(reply, "echo: ping");
    assert!(client.last_error().is_none());
}
