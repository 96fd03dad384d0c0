//! Realtime coaching session hub.
//!
//! Authenticated clients keep one WebSocket connection each. The hub tracks which
//! connection belongs to which room (a user's personal room, trainer sessions and
//! challenges), fans chat and workout events out to room members, keeps short-lived
//! chat and heart-rate history in an ephemeral store, and alerts the session when a
//! heart-rate sample looks abnormal.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
