//! egui panels and UI state for the chat client.

pub mod state;
pub mod theme;
pub mod panels;
