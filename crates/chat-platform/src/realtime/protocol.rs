//! Phoenix channel frames spoken by the realtime service.
//!
//! Frames are JSON objects `{topic, event, payload, ref, join_ref}`.
//! Row inserts arrive as `postgres_changes` events whose
//! `payload.data.record` is the new row.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use chat_core::ports::InsertFilter;
use chat_types::{Result, message::ChatMessage};

pub const PHOENIX_TOPIC: &str = "phoenix";
pub const EVENT_JOIN: &str = "phx_join";
pub const EVENT_LEAVE: &str = "phx_leave";
pub const EVENT_REPLY: &str = "phx_reply";
pub const EVENT_ERROR: &str = "phx_error";
pub const EVENT_CLOSE: &str = "phx_close";
pub const EVENT_HEARTBEAT: &str = "heartbeat";
pub const EVENT_POSTGRES_CHANGES: &str = "postgres_changes";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoenixFrame {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub msg_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_ref: Option<String>,
}

impl PhoenixFrame {
    pub fn to_text(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Join `topic`, asking for INSERT changes that match `filter`.
pub fn join_frame(
    topic: &str,
    filter: &InsertFilter,
    access_token: Option<&str>,
    msg_ref: u64,
) -> PhoenixFrame {
    let mut payload = json!({
        "config": {
            "broadcast": { "ack": false, "self": false },
            "presence": { "key": "" },
            "postgres_changes": [{
                "event": "INSERT",
                "schema": filter.schema,
                "table": filter.table,
                "filter": filter.expression(),
            }],
        }
    });
    if let Some(token) = access_token {
        payload["access_token"] = json!(token);
    }
    PhoenixFrame {
        topic: topic.to_string(),
        event: EVENT_JOIN.to_string(),
        payload,
        msg_ref: Some(msg_ref.to_string()),
        join_ref: Some(msg_ref.to_string()),
    }
}

pub fn leave_frame(topic: &str, msg_ref: u64) -> PhoenixFrame {
    PhoenixFrame {
        topic: topic.to_string(),
        event: EVENT_LEAVE.to_string(),
        payload: json!({}),
        msg_ref: Some(msg_ref.to_string()),
        join_ref: None,
    }
}

pub fn heartbeat_frame(msg_ref: u64) -> PhoenixFrame {
    PhoenixFrame {
        topic: PHOENIX_TOPIC.to_string(),
        event: EVENT_HEARTBEAT.to_string(),
        payload: json!({}),
        msg_ref: Some(msg_ref.to_string()),
        join_ref: None,
    }
}

/// What an inbound frame means for one channel
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Insert(ChatMessage),
    Joined,
    JoinRejected(String),
    Closed,
    /// Heartbeat replies, other topics, presence and system chatter
    Ignored,
}

pub fn decode_frame(topic: &str, text: &str) -> Result<Inbound> {
    let frame: PhoenixFrame = serde_json::from_str(text)?;
    if frame.topic != topic {
        return Ok(Inbound::Ignored);
    }

    match frame.event.as_str() {
        EVENT_POSTGRES_CHANGES => {
            let data = &frame.payload["data"];
            let is_insert = data["type"].as_str() == Some("INSERT");
            match data.get("record") {
                Some(record) if is_insert => {
                    Ok(Inbound::Insert(serde_json::from_value(record.clone())?))
                }
                _ => Ok(Inbound::Ignored),
            }
        }
        EVENT_REPLY => {
            // Only the join reply carries `join_ref == ref`.
            if frame.join_ref.is_none() || frame.join_ref != frame.msg_ref {
                return Ok(Inbound::Ignored);
            }
            match frame.payload["status"].as_str() {
                Some("ok") => Ok(Inbound::Joined),
                _ => Ok(Inbound::JoinRejected(
                    frame.payload["response"]["reason"]
                        .as_str()
                        .unwrap_or("join rejected")
                        .to_string(),
                )),
            }
        }
        EVENT_ERROR | EVENT_CLOSE => Ok(Inbound::Closed),
        _ => Ok(Inbound::Ignored),
    }
}
