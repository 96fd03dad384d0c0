//! Data Transfer Objects (DTOs) for the coaching session hub.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket frame DTOs (inbound and outbound)
//! - `http`: HTTP API response DTOs

pub mod conversion;
pub mod http;
pub mod websocket;
