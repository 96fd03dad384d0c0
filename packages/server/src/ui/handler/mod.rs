//! Request handlers.

mod credential;
mod http;
mod websocket;

pub use http::{get_chat_history, get_heart_rate_history, get_room_members, health_check};
pub use websocket::websocket_handler;
