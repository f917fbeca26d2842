//! Main egui application — wires the adapters into the core services and
//! routes panel actions to them.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use egui::{self, CentralPanel};

use chat_core::assistant::AssistantClient;
use chat_core::entry::{EntryFlow, EntryState};
use chat_core::event_bus::EventBus;
use chat_core::history::ChatHistory;
use chat_core::ports::{AuthPort, GenerationPort, MessageStorePort, RealtimePort};
use chat_core::turn::ChatTurn;
use chat_platform::auth::GoTrueAuth;
use chat_platform::backend::{MemoryBackend, PostgrestStore};
use chat_platform::llm::ProxyGenerationClient;
use chat_platform::offline::{LocalAuth, OfflineGeneration};
use chat_platform::realtime::RealtimeClient;
use chat_platform::storage::auto_detect_storage;
use chat_types::config::ChatConfig;
use chat_types::event::Toast;
use chat_ui::panels::auth::{self as auth_panel, AuthAction};
use chat_ui::panels::chat::{self, ChatAction, ChatView};
use chat_ui::panels::{api_key, toasts};
use chat_ui::state::UiState;
use chat_ui::theme;

/// Poll interval for realtime deliveries while the chat is open
const PUMP_INTERVAL: Duration = Duration::from_millis(250);

/// The main application state
pub struct ChatApp {
    ui_state: UiState,
    event_bus: EventBus,
    auth: Rc<dyn AuthPort>,
    history: ChatHistory,
    assistant: AssistantClient,
    turn: ChatTurn,
    entry: Rc<RefCell<EntryFlow>>,
    auth_pending: Rc<Cell<bool>>,
    attached_user: Option<String>,
    first_frame: bool,
}

impl ChatApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let config = ChatConfig::from_build_env();
        let event_bus = EventBus::new();
        let storage = auto_detect_storage();

        let (auth, store, realtime, generation): (
            Rc<dyn AuthPort>,
            Rc<dyn MessageStorePort>,
            Rc<dyn RealtimePort>,
            Rc<dyn GenerationPort>,
        ) = if config.is_configured() {
            log::info!("Backend: {}", config.backend_url);
            let auth: Rc<dyn AuthPort> = Rc::new(GoTrueAuth::new(config.clone(), storage));
            (
                auth.clone(),
                Rc::new(PostgrestStore::new(config.clone(), auth.clone())),
                Rc::new(RealtimeClient::new(config.clone(), auth.clone())),
                Rc::new(ProxyGenerationClient::new(&config)),
            )
        } else {
            log::warn!("No backend configured. Running offline with in-memory storage.");
            let backend = Rc::new(MemoryBackend::new());
            (
                Rc::new(LocalAuth::new(storage)),
                backend.clone(),
                backend,
                Rc::new(OfflineGeneration),
            )
        };

        let history = ChatHistory::new(store, realtime, event_bus.clone(), config.messages_table.clone());
        let assistant = AssistantClient::new(auth.clone(), generation, event_bus.clone());
        let turn = ChatTurn::new(history.clone(), assistant.clone(), event_bus.clone());
        let entry = Rc::new(RefCell::new(EntryFlow::new(config.require_api_key)));

        Self::restore_session(auth.clone(), entry.clone(), cc.egui_ctx.clone());

        Self {
            ui_state: UiState::new(),
            event_bus,
            auth,
            history,
            assistant,
            turn,
            entry,
            auth_pending: Rc::new(Cell::new(false)),
            attached_user: None,
            first_frame: true,
        }
    }

    /// Resolve the persisted session (async)
    fn restore_session(auth: Rc<dyn AuthPort>, entry: Rc<RefCell<EntryFlow>>, ctx: egui::Context) {
        wasm_bindgen_futures::spawn_local(async move {
            let session = match auth.restore().await {
                Ok(session) => session,
                Err(e) => {
                    log::warn!("Session restore failed: {}", e);
                    None
                }
            };
            entry.borrow_mut().session_resolved(session.as_ref());
            ctx.request_repaint();
        });
    }

    /// Keep the history attached to whoever is chatting.
    fn sync_history(&mut self) {
        let chatting = self.entry.borrow().chatting_user().map(str::to_string);
        if chatting == self.attached_user {
            return;
        }
        match &chatting {
            Some(user_id) => {
                let history = self.history.clone();
                let user_id = user_id.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    history.attach(&user_id).await;
                });
            }
            None => self.history.detach(),
        }
        self.attached_user = chatting;
    }

    fn user_label(&self) -> String {
        self.auth
            .current_session()
            .and_then(|s| s.user.email)
            .unwrap_or_default()
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.first_frame {
            theme::apply_theme(ctx);
            self.first_frame = false;
        }

        self.sync_history();
        self.history.pump();

        let now = ctx.input(|i| i.time);
        let events = self.event_bus.drain();
        if !events.is_empty() {
            self.ui_state.process_events(events, now);
            ctx.request_repaint();
        }
        if self.ui_state.expire_toasts(now) {
            ctx.request_repaint_after(Duration::from_millis(500));
        }
        self.ui_state.auth_pending = self.auth_pending.get();

        let state = self.entry.borrow().state().clone();
        CentralPanel::default().show(ctx, |ui| match state {
            EntryState::LoadingAuth => toasts::loading_screen(ui, "Loading..."),
            EntryState::Unauthenticated => {
                if let Some(action) = auth_panel::auth_panel(ui, &mut self.ui_state) {
                    self.dispatch_auth(action, ctx);
                }
            }
            EntryState::AwaitingApiKey => {
                if let Some(key) = api_key::api_key_panel(ui, &mut self.ui_state) {
                    if !self.entry.borrow_mut().submit_api_key(&key) {
                        self.ui_state.push_toast(Toast::error("Please enter an API key"), now);
                    }
                }
            }
            EntryState::Chatting { .. } => {
                let messages = self.history.messages();
                let user_label = self.user_label();
                let view = ChatView {
                    messages: &messages,
                    loading: self.history.is_loading(),
                    busy: self.assistant.is_busy(),
                    user_label: &user_label,
                };
                if let Some(action) = chat::chat_panel(ui, &mut self.ui_state, &view) {
                    self.dispatch_chat(action, ctx);
                }
                ctx.request_repaint_after(PUMP_INTERVAL);
            }
        });

        toasts::toasts_overlay(ctx, &mut self.ui_state);
    }
}

impl ChatApp {
    /// Sign in or sign up (async)
    fn dispatch_auth(&self, action: AuthAction, ctx: &egui::Context) {
        let auth = self.auth.clone();
        let entry = self.entry.clone();
        let events = self.event_bus.clone();
        let pending = self.auth_pending.clone();
        let ctx = ctx.clone();

        pending.set(true);
        wasm_bindgen_futures::spawn_local(async move {
            let result = match action {
                AuthAction::SignIn { email, password } => auth.sign_in(&email, &password).await.map(Some),
                AuthAction::SignUp { email, password } => auth.sign_up(&email, &password).await,
            };
            pending.set(false);
            match result {
                Ok(Some(session)) => entry.borrow_mut().session_resolved(Some(&session)),
                Ok(None) => events.toast(Toast::success("Check your email to confirm your account")),
                Err(e) => {
                    log::warn!("Authentication failed: {}", e);
                    events.toast(Toast::error(e.to_string()));
                }
            }
            ctx.request_repaint();
        });
    }

    /// Route a chat panel action (async where it touches the network)
    fn dispatch_chat(&mut self, action: ChatAction, ctx: &egui::Context) {
        let ctx = ctx.clone();
        match action {
            ChatAction::Send { text, image } => {
                let turn = self.turn.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    if let Err(e) = turn.run(&text, image).await {
                        log::error!("Chat turn error: {}", e);
                    }
                    ctx.request_repaint();
                });
            }
            ChatAction::ClearHistory => {
                let history = self.history.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    history.clear().await;
                    ctx.request_repaint();
                });
            }
            ChatAction::SignOut => {
                self.entry.borrow_mut().signed_out();
                self.ui_state.reset_for_sign_out();
                let auth = self.auth.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    if let Err(e) = auth.sign_out().await {
                        log::warn!("Sign out failed: {}", e);
                    }
                    ctx.request_repaint();
                });
            }
        }
    }
}
