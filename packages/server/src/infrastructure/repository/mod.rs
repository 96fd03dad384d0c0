//! Repository 実装
//!
//! - `inmemory`: プロセス内の実装（Room Directory と開発用 Ephemeral Store）
//! - `redis_store`: Redis を使った Ephemeral Store

pub mod inmemory;
pub mod redis_store;

pub use inmemory::{InMemoryEphemeralStore, InMemoryRoomDirectory};
pub use redis_store::RedisEphemeralStore;
