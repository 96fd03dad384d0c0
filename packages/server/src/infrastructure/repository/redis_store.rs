//! Redis-backed ephemeral store for production deployments.
//!
//! Lists map onto `RPUSH` / `LTRIM` / `LRANGE`; the chat-history TTL is reset with `EXPIRE`
//! in the same atomic pipeline as the append.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;

use crate::domain::{EphemeralStore, StoreError};

fn unavailable(e: redis::RedisError) -> StoreError {
    StoreError::StoreUnavailable(e.to_string())
}

/// Redis-backed [`EphemeralStore`].
#[derive(Clone)]
pub struct RedisEphemeralStore {
    conn: MultiplexedConnection,
}

impl RedisEphemeralStore {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }

    /// Open a multiplexed connection to `url` (`redis://` or `rediss://`).
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(unavailable)?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(unavailable)?;
        Ok(Self::new(conn))
    }
}

#[async_trait]
impl EphemeralStore for RedisEphemeralStore {
    async fn append(&self, key: &str, value: String) -> Result<usize, StoreError> {
        let mut conn = self.conn.clone();
        conn.rpush::<_, _, usize>(key, value)
            .await
            .map_err(unavailable)
    }

    async fn append_with_ttl(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> Result<usize, StoreError> {
        let mut conn = self.conn.clone();
        let (len,): (usize,) = redis::pipe()
            .atomic()
            .rpush(key, value)
            .expire(key, ttl.as_secs() as i64)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(len)
    }

    async fn trim_to_last(&self, key: &str, n: usize) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        if n == 0 {
            return conn.del::<_, ()>(key).await.map_err(unavailable);
        }
        conn.ltrim::<_, ()>(key, -(n as isize), -1)
            .await
            .map_err(unavailable)
    }

    async fn list_since(&self, key: &str, start: usize) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        conn.lrange::<_, Vec<String>>(key, start as isize, -1)
            .await
            .map_err(unavailable)
    }

    async fn expires_in(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        let mut conn = self.conn.clone();
        // -2: no such key, -1: no expiry
        let ttl: i64 = conn.ttl(key).await.map_err(unavailable)?;
        Ok((ttl >= 0).then(|| Duration::from_secs(ttl as u64)))
    }
}
