//! Realtime adapter — one websocket per subscription.
//!
//! Architecture:
//! - `subscribe_inserts` opens the socket and spawns three local tasks:
//!   a writer (join, heartbeats, leave), a heartbeat ticker feeding the
//!   writer, and a reader decoding inserts onto the feed channel.
//! - Releasing the feed queues a `Leave`: the writer sends `phx_leave`,
//!   closes the socket and exits; the ticker and reader stop with it.
//! - When the reader ends first (join rejected, server close, socket
//!   error) it queues the same `Leave` and drops the feed sender, so the
//!   subscriber sees the feed close.

use std::rc::Rc;

use futures::channel::mpsc;
use futures::{SinkExt, StreamExt};
use gloo_net::websocket::{futures::WebSocket, Message};
use gloo_timers::future::TimeoutFuture;
use wasm_bindgen_futures::spawn_local;

use chat_core::ports::{AuthPort, ChannelRelease, InsertFilter, RealtimeFeed, RealtimePort};
use chat_types::{ChatError, Result, config::ChatConfig, message::ChatMessage};
use super::protocol::{self, Inbound, PhoenixFrame};

enum Outbound {
    Heartbeat,
    Leave,
}

pub struct RealtimeClient {
    config: ChatConfig,
    auth: Rc<dyn AuthPort>,
}

impl RealtimeClient {
    pub fn new(config: ChatConfig, auth: Rc<dyn AuthPort>) -> Self {
        Self { config, auth }
    }
}

impl RealtimePort for RealtimeClient {
    fn subscribe_inserts(&self, filter: InsertFilter) -> Result<RealtimeFeed> {
        let socket = WebSocket::open(&self.config.realtime_url())
            .map_err(|e| ChatError::Network(format!("Failed to open realtime socket: {}", e)))?;

        let topic = format!("realtime:{}-{}", filter.table, uuid::Uuid::new_v4().simple());

        let (rows_tx, rows_rx) = mpsc::unbounded();
        let (out_tx, out_rx) = mpsc::unbounded();
        let (sink, stream) = socket.split();

        spawn_local(run_writer(sink, out_rx, self.auth.clone(), filter, topic.clone()));
        spawn_local(run_heartbeat(out_tx.clone(), self.config.realtime_heartbeat_ms));
        spawn_local(run_reader(stream, topic.clone(), rows_tx, out_tx.clone()));

        Ok(RealtimeFeed {
            topic,
            rows: rows_rx,
            release: Box::new(SocketRelease { out_tx }),
        })
    }
}

struct SocketRelease {
    out_tx: mpsc::UnboundedSender<Outbound>,
}

impl ChannelRelease for SocketRelease {
    fn release(&mut self) {
        // A closed writer means the socket is already gone.
        let _ = self.out_tx.unbounded_send(Outbound::Leave);
    }
}

type SocketSink = futures::stream::SplitSink<WebSocket, Message>;
type SocketStream = futures::stream::SplitStream<WebSocket>;

async fn send_frame(sink: &mut SocketSink, frame: &PhoenixFrame) -> Result<()> {
    let text = frame.to_text()?;
    sink.send(Message::Text(text))
        .await
        .map_err(|e| ChatError::Network(e.to_string()))
}

async fn run_writer(
    mut sink: SocketSink,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    auth: Rc<dyn AuthPort>,
    filter: InsertFilter,
    topic: String,
) {
    let mut next_ref: u64 = 2;

    // Joins with the anon key alone when there is no usable session.
    let access_token = auth.active_session().await.map(|s| s.access_token);
    let join = protocol::join_frame(&topic, &filter, access_token.as_deref(), 1);

    if let Err(e) = send_frame(&mut sink, &join).await {
        log::error!("Realtime join for {} failed: {}", topic, e);
        return;
    }

    while let Some(command) = outbound.next().await {
        let msg_ref = next_ref;
        next_ref += 1;
        match command {
            Outbound::Heartbeat => {
                if let Err(e) = send_frame(&mut sink, &protocol::heartbeat_frame(msg_ref)).await {
                    log::warn!("Realtime heartbeat for {} failed: {}", topic, e);
                    break;
                }
            }
            Outbound::Leave => {
                if let Err(e) = send_frame(&mut sink, &protocol::leave_frame(&topic, msg_ref)).await {
                    log::debug!("phx_leave for {} not sent: {}", topic, e);
                }
                break;
            }
        }
    }

    if let Err(e) = sink.close().await {
        log::debug!("Closing realtime socket for {}: {}", topic, e);
    }
    log::info!("Realtime channel {} closed", topic);
}

async fn run_heartbeat(out_tx: mpsc::UnboundedSender<Outbound>, interval_ms: u32) {
    loop {
        TimeoutFuture::new(interval_ms).await;
        if out_tx.unbounded_send(Outbound::Heartbeat).is_err() {
            break;
        }
    }
}

async fn run_reader(
    mut stream: SocketStream,
    topic: String,
    rows_tx: mpsc::UnboundedSender<ChatMessage>,
    out_tx: mpsc::UnboundedSender<Outbound>,
) {
    while let Some(message) = stream.next().await {
        let text = match message {
            Ok(Message::Text(text)) => text,
            Ok(Message::Bytes(_)) => continue,
            Err(e) => {
                log::warn!("Realtime socket error on {}: {}", topic, e);
                break;
            }
        };

        match protocol::decode_frame(&topic, &text) {
            Ok(Inbound::Insert(row)) => {
                if rows_tx.unbounded_send(row).is_err() {
                    // Subscriber gone.
                    break;
                }
            }
            Ok(Inbound::Joined) => log::info!("Joined realtime channel {}", topic),
            Ok(Inbound::JoinRejected(reason)) => {
                log::error!("Realtime join rejected for {}: {}", topic, reason);
                break;
            }
            Ok(Inbound::Closed) => break,
            Ok(Inbound::Ignored) => {}
            Err(e) => log::warn!("Undecodable realtime frame on {}: {}", topic, e),
        }
    }

    // Already gone if the feed was released first.
    let _ = out_tx.unbounded_send(Outbound::Leave);
    log::debug!("Realtime reader for {} stopped", topic);
}
