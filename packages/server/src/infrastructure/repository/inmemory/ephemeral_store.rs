//! InMemory Ephemeral Store 実装
//!
//! 開発・テスト用に外部 KVS のリスト + TTL の振る舞いを再現します。
//! 期限切れのキーはアクセス時に遅延削除されます。

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use coachlive_shared::time::{Clock, SystemClock};
use tokio::sync::Mutex;

use crate::domain::{EphemeralStore, StoreError};

struct Entry {
    values: VecDeque<String>,
    /// Unix ミリ秒。`None` は無期限
    expires_at: Option<i64>,
}

pub struct InMemoryEphemeralStore {
    entries: Mutex<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryEphemeralStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    fn purge_if_expired(entries: &mut HashMap<String, Entry>, key: &str, now: i64) {
        let expired = entries
            .get(key)
            .and_then(|entry| entry.expires_at)
            .is_some_and(|expires_at| expires_at <= now);
        if expired {
            entries.remove(key);
        }
    }

    async fn push(&self, key: &str, value: String, ttl: Option<Duration>) -> usize {
        let now = self.clock.now_millis();
        let mut entries = self.entries.lock().await;
        Self::purge_if_expired(&mut entries, key, now);

        let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
            values: VecDeque::new(),
            expires_at: None,
        });
        entry.values.push_back(value);
        if let Some(ttl) = ttl {
            entry.expires_at = Some(now + ttl.as_millis() as i64);
        }
        entry.values.len()
    }
}

impl Default for InMemoryEphemeralStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

#[async_trait]
impl EphemeralStore for InMemoryEphemeralStore {
    async fn append(&self, key: &str, value: String) -> Result<usize, StoreError> {
        Ok(self.push(key, value, None).await)
    }

    async fn append_with_ttl(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> Result<usize, StoreError> {
        Ok(self.push(key, value, Some(ttl)).await)
    }

    async fn trim_to_last(&self, key: &str, n: usize) -> Result<(), StoreError> {
        let now = self.clock.now_millis();
        let mut entries = self.entries.lock().await;
        Self::purge_if_expired(&mut entries, key, now);

        if let Some(entry) = entries.get_mut(key) {
            let overflow = entry.values.len().saturating_sub(n);
            entry.values.drain(..overflow);
            if entry.values.is_empty() {
                entries.remove(key);
            }
        }
        Ok(())
    }

    async fn list_since(&self, key: &str, start: usize) -> Result<Vec<String>, StoreError> {
        let now = self.clock.now_millis();
        let mut entries = self.entries.lock().await;
        Self::purge_if_expired(&mut entries, key, now);

        Ok(entries
            .get(key)
            .map(|entry| entry.values.iter().skip(start).cloned().collect())
            .unwrap_or_default())
    }

    async fn expires_in(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        let now = self.clock.now_millis();
        let mut entries = self.entries.lock().await;
        Self::purge_if_expired(&mut entries, key, now);

        Ok(entries
            .get(key)
            .and_then(|entry| entry.expires_at)
            .map(|expires_at| Duration::from_millis((expires_at - now).max(0) as u64)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coachlive_shared::time::ManualClock;

    const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

    fn store_with_clock() -> (InMemoryEphemeralStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        (InMemoryEphemeralStore::new(clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_append_and_list_since() {
        // テスト項目: 追記した値が古い順に取得でき、start 以降に絞り込める
        // given (前提条件):
        let (store, _clock) = store_with_clock();

        // when (操作):
        store.append("k", "a".to_string()).await.unwrap();
        store.append("k", "b".to_string()).await.unwrap();
        let len = store.append("k", "c".to_string()).await.unwrap();

        // then (期待する結果):
        assert_eq!(len, 3);
        assert_eq!(store.list_since("k", 0).await.unwrap(), vec!["a", "b", "c"]);
        assert_eq!(store.list_since("k", 2).await.unwrap(), vec!["c"]);
        assert!(store.list_since("missing", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_trim_to_last_drops_oldest() {
        // テスト項目: trim_to_last は末尾 n 件だけを残す
        // given (前提条件):
        let (store, _clock) = store_with_clock();
        for i in 0..5 {
            store.append("k", i.to_string()).await.unwrap();
        }

        // when (操作):
        store.trim_to_last("k", 3).await.unwrap();

        // then (期待する結果):
        assert_eq!(store.list_since("k", 0).await.unwrap(), vec!["2", "3", "4"]);
    }

    #[tokio::test]
    async fn test_append_with_ttl_resets_expiry() {
        // テスト項目: TTL 付き追記はキーの期限を追記時刻から数え直す
        // given (前提条件):
        let (store, clock) = store_with_clock();
        let ttl = Duration::from_millis(30 * DAY_MILLIS as u64);
        store
            .append_with_ttl("chat", "first".to_string(), ttl)
            .await
            .unwrap();

        // when (操作): 10 日後にもう一度追記
        clock.advance(10 * DAY_MILLIS);
        store
            .append_with_ttl("chat", "second".to_string(), ttl)
            .await
            .unwrap();

        // then (期待する結果): 残り期限は再び 30 日
        assert_eq!(store.expires_in("chat").await.unwrap(), Some(ttl));

        // when (操作): そこから 30 日経過
        clock.advance(30 * DAY_MILLIS);

        // then (期待する結果): キーごと消える
        assert!(store.list_since("chat", 0).await.unwrap().is_empty());
        assert_eq!(store.expires_in("chat").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_append_without_ttl_keeps_no_expiry() {
        // テスト項目: TTL なしの追記は期限を持たない
        // given (前提条件):
        let (store, _clock) = store_with_clock();

        // when (操作):
        store.append("hr", "75".to_string()).await.unwrap();

        // then (期待する結果):
        assert_eq!(store.expires_in("hr").await.unwrap(), None);
    }
}
