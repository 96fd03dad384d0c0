//! ユーザーディレクトリ実装
//!
//! - `InMemoryUserDirectory`: 起動時に JSON ファイルから読み込む（開発・テスト用）
//! - `HttpUserDirectory`: 外部のユーザー API に問い合わせる

use std::{collections::HashMap, path::Path, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::domain::{UserDirectory, UserId, UserLookupError, UserRecord};

/// インメモリのユーザーディレクトリ
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: HashMap<UserId, UserRecord>,
}

impl InMemoryUserDirectory {
    pub fn from_records(records: impl IntoIterator<Item = UserRecord>) -> Self {
        Self {
            users: records
                .into_iter()
                .map(|record| (record.id.clone(), record))
                .collect(),
        }
    }

    /// `[{"id": "...", "name": "...", "avatar": null, "active": true}, ...]` 形式の JSON を読み込む
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let raw = std::fs::read_to_string(path)?;
        let records: Vec<UserRecord> = serde_json::from_str(&raw)?;
        Ok(Self::from_records(records))
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_id(&self, user_id: &UserId) -> Result<Option<UserRecord>, UserLookupError> {
        Ok(self.users.get(user_id).cloned())
    }
}

/// 外部のユーザー API（`GET {base_url}/users/{id}`）に問い合わせるユーザーディレクトリ
pub struct HttpUserDirectory {
    http_client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpUserDirectory {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl UserDirectory for HttpUserDirectory {
    async fn find_by_id(&self, user_id: &UserId) -> Result<Option<UserRecord>, UserLookupError> {
        let response = self
            .http_client
            .get(format!("{}/users/{}", self.base_url, user_id))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| UserLookupError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<UserRecord>()
                .await
                .map(Some)
                .map_err(|e| UserLookupError::Unavailable(e.to_string())),
            status => Err(UserLookupError::Unavailable(format!(
                "user directory responded with {}",
                status
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, active: bool) -> UserRecord {
        UserRecord {
            id: UserId::new(id.to_string()).unwrap(),
            name: id.to_uppercase(),
            avatar: None,
            active,
        }
    }

    #[tokio::test]
    async fn test_find_by_id() {
        // テスト項目: 登録済みユーザーは見つかり、未登録ユーザーは None
        // given (前提条件):
        let directory = InMemoryUserDirectory::from_records([record("a", true), record("b", false)]);

        // when (操作):
        let found = directory
            .find_by_id(&UserId::new("b".to_string()).unwrap())
            .await
            .unwrap();
        let missing = directory
            .find_by_id(&UserId::new("z".to_string()).unwrap())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(found, Some(record("b", false)));
        assert_eq!(missing, None);
        assert_eq!(directory.len(), 2);
    }

    #[test]
    fn test_from_json_file() {
        // テスト項目: JSON ファイルからユーザーを読み込める
        // given (前提条件):
        let path = std::env::temp_dir().join(format!("coachlive-users-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"[{"id":"alice","name":"Alice","avatar":"https://cdn/a.png","active":true},
                {"id":"bob","name":"Bob","active":false}]"#,
        )
        .unwrap();

        // when (操作):
        let directory = InMemoryUserDirectory::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        // then (期待する結果):
        assert_eq!(directory.len(), 2);
    }
}
