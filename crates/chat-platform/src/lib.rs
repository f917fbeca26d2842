//! Browser platform adapters for the chat core ports.

pub mod http;
pub mod auth;
pub mod backend;
pub mod realtime;
pub mod llm;
pub mod storage;
pub mod offline;
