//! Chat core — history store, AI client and entry flow over port traits.

pub mod ports;
pub mod event_bus;
pub mod subscription;
pub mod history;
pub mod assistant;
pub mod entry;
pub mod turn;
