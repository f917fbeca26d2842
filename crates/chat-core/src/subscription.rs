//! Scoped ownership of a push subscription.
//!
//! A `Subscription` owns one realtime feed. Its channel is released exactly
//! once: on an explicit `release()`, or when the guard is dropped.

use chat_types::message::ChatMessage;
use crate::ports::{ChannelRelease, RealtimeFeed};

pub struct Subscription {
    topic: String,
    rows: futures::channel::mpsc::UnboundedReceiver<ChatMessage>,
    release: Option<Box<dyn ChannelRelease>>,
}

impl Subscription {
    pub fn new(feed: RealtimeFeed) -> Self {
        log::debug!("Subscribed to {}", feed.topic);
        Self {
            topic: feed.topic,
            rows: feed.rows,
            release: Some(feed.release),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }

    /// Take every row delivered since the last call, without waiting.
    ///
    /// A feed whose sender has gone away is released here, so
    /// `is_active` turns false once its last rows are drained.
    pub fn drain(&mut self) -> Vec<ChatMessage> {
        let mut rows = Vec::new();
        if !self.is_active() {
            return rows;
        }
        loop {
            match self.rows.try_next() {
                Ok(Some(row)) => rows.push(row),
                Ok(None) => {
                    log::warn!("Feed {} closed by its source", self.topic);
                    self.release();
                    break;
                }
                // Nothing queued.
                Err(_) => break,
            }
        }
        rows
    }

    pub fn release(&mut self) {
        if let Some(mut handle) = self.release.take() {
            handle.release();
            self.rows.close();
            log::debug!("Released subscription {}", self.topic);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}
