//! In-memory message table with insert fan-out.
//!
//! Stands in for the hosted backend when none is configured. Inserts are
//! pushed to matching live subscribers before `insert` returns, the same
//! push-before-response ordering the hosted service can produce.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use futures::channel::mpsc;

use chat_core::ports::{ChannelRelease, InsertFilter, MessageStorePort, RealtimeFeed, RealtimePort};
use chat_types::{
    Result,
    message::{ChatMessage, NewMessage},
};

struct Subscriber {
    id: u64,
    filter: InsertFilter,
    tx: mpsc::UnboundedSender<ChatMessage>,
}

type Subscribers = RefCell<Vec<Subscriber>>;

pub struct MemoryBackend {
    rows: RefCell<Vec<ChatMessage>>,
    next_id: Cell<i64>,
    next_subscriber: Cell<u64>,
    subscribers: Rc<Subscribers>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            rows: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
            next_subscriber: Cell::new(1),
            subscribers: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.borrow().len()
    }

    fn publish(&self, row: &ChatMessage) {
        self.subscribers.borrow_mut().retain(|sub| {
            if !sub.filter.matches(row) {
                return true;
            }
            sub.tx.unbounded_send(row.clone()).is_ok()
        });
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl MessageStorePort for MemoryBackend {
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<ChatMessage>> {
        let mut rows: Vec<ChatMessage> = self
            .rows
            .borrow()
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(ChatMessage::sort_key);
        Ok(rows)
    }

    async fn insert(&self, message: NewMessage) -> Result<ChatMessage> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        // Keep created_at strictly increasing even within one clock tick.
        let mut created_at = Utc::now();
        if let Some(last) = self.rows.borrow().iter().map(|r| r.created_at).max() {
            if created_at <= last {
                created_at = last + Duration::microseconds(1);
            }
        }

        let row = message.into_row(id, created_at);
        self.rows.borrow_mut().push(row.clone());
        self.publish(&row);
        Ok(row)
    }

    async fn delete_for_user(&self, user_id: &str) -> Result<()> {
        self.rows.borrow_mut().retain(|r| r.user_id != user_id);
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

struct MemoryRelease {
    id: u64,
    subscribers: Weak<Subscribers>,
}

impl ChannelRelease for MemoryRelease {
    fn release(&mut self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            subscribers.borrow_mut().retain(|s| s.id != self.id);
        }
    }
}

impl RealtimePort for MemoryBackend {
    fn subscribe_inserts(&self, filter: InsertFilter) -> Result<RealtimeFeed> {
        let id = self.next_subscriber.get();
        self.next_subscriber.set(id + 1);

        let (tx, rx) = mpsc::unbounded();
        let topic = format!("memory:{}:{}", filter.table, filter.expression());
        self.subscribers.borrow_mut().push(Subscriber { id, filter, tx });

        Ok(RealtimeFeed {
            topic,
            rows: rx,
            release: Box::new(MemoryRelease {
                id,
                subscribers: Rc::downgrade(&self.subscribers),
            }),
        })
    }
}
