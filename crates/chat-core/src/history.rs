//! Chat history store.
//!
//! Holds the signed-in user's messages in memory, fed from two sources:
//! the initial load and the push subscription. Local saves and push
//! deliveries race; both go through `insert_unique`, so a row appears at
//! most once per identifier regardless of which source lands first.
//!
//! Storage failures never reach the caller. They are logged and turned
//! into toasts on the event bus.

use std::cell::RefCell;
use std::rc::Rc;

use chat_types::{
    event::{ChatEvent, Toast},
    message::{ChatMessage, NewMessage},
};
use crate::event_bus::EventBus;
use crate::ports::{InsertFilter, MessageStorePort, RealtimePort};
use crate::subscription::Subscription;

struct HistoryState {
    messages: Vec<ChatMessage>,
    loading: bool,
    user_id: Option<String>,
    subscription: Option<Subscription>,
    /// Bumped on every attach/detach; a load only applies if unchanged.
    generation: u64,
}

/// Shared history handle — clone-cheap via Rc.
#[derive(Clone)]
pub struct ChatHistory {
    store: Rc<dyn MessageStorePort>,
    realtime: Rc<dyn RealtimePort>,
    events: EventBus,
    table: String,
    state: Rc<RefCell<HistoryState>>,
}

impl ChatHistory {
    pub fn new(
        store: Rc<dyn MessageStorePort>,
        realtime: Rc<dyn RealtimePort>,
        events: EventBus,
        table: impl Into<String>,
    ) -> Self {
        Self {
            store,
            realtime,
            events,
            table: table.into(),
            state: Rc::new(RefCell::new(HistoryState {
                messages: Vec::new(),
                loading: true,
                user_id: None,
                subscription: None,
                generation: 0,
            })),
        }
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.state.borrow().messages.clone()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn user_id(&self) -> Option<String> {
        self.state.borrow().user_id.clone()
    }

    pub fn is_subscribed(&self) -> bool {
        self.state
            .borrow()
            .subscription
            .as_ref()
            .is_some_and(Subscription::is_active)
    }

    /// Bind the store to `user_id`: subscribe to inserts, then load.
    ///
    /// A no-op when already bound to the same user. Switching users
    /// releases the previous subscription first.
    pub async fn attach(&self, user_id: &str) {
        if self.user_id().as_deref() == Some(user_id) {
            return;
        }
        self.detach();
        {
            let mut state = self.state.borrow_mut();
            state.user_id = Some(user_id.to_string());
            state.loading = true;
            state.generation += 1;
        }
        self.subscribe(user_id);
        self.load(user_id).await;
    }

    /// Release the subscription and forget the current user.
    pub fn detach(&self) {
        // Take the guard out before dropping it so release runs without a
        // live borrow of the state.
        let previous = {
            let mut state = self.state.borrow_mut();
            state.user_id = None;
            state.messages.clear();
            state.loading = false;
            state.generation += 1;
            state.subscription.take()
        };
        drop(previous);
    }

    /// Fetch every stored row for `user_id`, oldest first.
    ///
    /// The result is dropped if the store was attached or detached while
    /// the fetch was in flight.
    pub async fn load(&self, user_id: &str) {
        let started = self.state.borrow().generation;
        let result = self.store.list_for_user(user_id).await;

        let mut state = self.state.borrow_mut();
        if state.generation != started {
            log::debug!("Discarding history load for {}: binding changed", user_id);
            return;
        }
        state.loading = false;

        match result {
            Ok(mut rows) => {
                rows.sort_by_key(ChatMessage::sort_key);
                // Keep pushes that landed after the fetch snapshot.
                let newest = rows.last().map(|r| r.id).unwrap_or(i64::MIN);
                let late: Vec<ChatMessage> = state
                    .messages
                    .drain(..)
                    .filter(|m| m.user_id == user_id && m.id > newest)
                    .collect();
                state.messages = rows;
                for row in late {
                    insert_sorted(&mut state.messages, row);
                }
                let len = state.messages.len();
                drop(state);
                log::info!("Loaded {} messages for {}", len, user_id);
                self.events.emit(ChatEvent::HistoryChanged { len });
            }
            Err(e) => {
                drop(state);
                log::error!("Failed to load chat history: {}", e);
                self.events.toast(Toast::error("Failed to load chat history"));
            }
        }
    }

    /// Open the push subscription for `user_id`, replacing any previous one.
    pub fn subscribe(&self, user_id: &str) {
        let filter = InsertFilter::for_user(self.table.clone(), user_id);
        let previous = self.state.borrow_mut().subscription.take();
        drop(previous);

        match self.realtime.subscribe_inserts(filter) {
            Ok(feed) => {
                self.state.borrow_mut().subscription = Some(Subscription::new(feed));
            }
            Err(e) => {
                log::error!("Failed to subscribe to message inserts: {}", e);
                self.events.toast(Toast::error("Live updates unavailable"));
            }
        }
    }

    /// Apply push deliveries received since the last call.
    /// Returns how many rows were added.
    pub fn pump(&self) -> usize {
        let (delivered, closed) = {
            let mut state = self.state.borrow_mut();
            let Some(sub) = state.subscription.as_mut() else {
                return 0;
            };
            let rows = sub.drain();
            (rows, !sub.is_active())
        };

        if closed {
            let dead = self.state.borrow_mut().subscription.take();
            drop(dead);
            log::error!("Message insert feed closed; live updates stopped");
            self.events.toast(Toast::error("Live updates unavailable"));
        }

        let added = delivered
            .into_iter()
            .filter(|row| self.insert_unique(row.clone()))
            .count();
        if added > 0 {
            self.events.emit(ChatEvent::HistoryChanged { len: self.len() });
        }
        added
    }

    /// Persist a message for the current user.
    ///
    /// Returns `None` when no user is bound or the insert failed.
    pub async fn save(
        &self,
        content: &str,
        is_ai: bool,
        image_url: Option<String>,
    ) -> Option<ChatMessage> {
        let user_id = self.user_id()?;
        let new_message = NewMessage {
            is_ai,
            ..NewMessage::user(user_id, content)
        }
        .with_image(image_url);

        match self.store.insert(new_message).await {
            Ok(row) => {
                // The push feed may already have delivered this id.
                if self.insert_unique(row.clone()) {
                    self.events.emit(ChatEvent::HistoryChanged { len: self.len() });
                }
                Some(row)
            }
            Err(e) => {
                log::error!("Failed to save message: {}", e);
                self.events.toast(Toast::error("Failed to save message"));
                None
            }
        }
    }

    /// Delete all stored rows for the current user.
    pub async fn clear(&self) {
        let Some(user_id) = self.user_id() else {
            return;
        };

        match self.store.delete_for_user(&user_id).await {
            Ok(()) => {
                self.state.borrow_mut().messages.clear();
                self.events.emit(ChatEvent::HistoryChanged { len: 0 });
                self.events.toast(Toast::success("Chat history cleared"));
            }
            Err(e) => {
                log::error!("Failed to clear chat history: {}", e);
                self.events.toast(Toast::error("Failed to clear chat history"));
            }
        }
    }

    /// Add `row` unless an entry with its id is already held, or it belongs
    /// to a different user than the one bound.
    fn insert_unique(&self, row: ChatMessage) -> bool {
        let mut state = self.state.borrow_mut();
        if state.user_id.as_deref().is_some_and(|u| u != row.user_id) {
            return false;
        }
        if state.messages.iter().any(|m| m.id == row.id) {
            return false;
        }
        insert_sorted(&mut state.messages, row);
        true
    }
}

fn insert_sorted(messages: &mut Vec<ChatMessage>, row: ChatMessage) {
    let key = row.sort_key();
    let at = messages.partition_point(|m| m.sort_key() <= key);
    messages.insert(at, row);
}
