pub mod auth;
pub mod api_key;
pub mod chat;
pub mod toasts;
