//! 投稿オーナーの解決
//!
//! 投稿 ID の文字列からオーナーを推測せず、必ず対応表を引く。

use std::{collections::HashMap, path::Path};

use async_trait::async_trait;

use crate::domain::{OwnerLookupError, PostOwnerResolver, UserId};

#[derive(Debug, Default)]
pub struct InMemoryPostOwnerResolver {
    owners: HashMap<String, UserId>,
}

impl InMemoryPostOwnerResolver {
    pub fn new(owners: HashMap<String, UserId>) -> Self {
        Self { owners }
    }

    /// `{"<post_id>": "<owner_user_id>", ...}` 形式の JSON を読み込む
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let raw = std::fs::read_to_string(path)?;
        Ok(Self::new(serde_json::from_str(&raw)?))
    }
}

#[async_trait]
impl PostOwnerResolver for InMemoryPostOwnerResolver {
    async fn resolve_owner(&self, post_id: &str) -> Result<UserId, OwnerLookupError> {
        self.owners
            .get(post_id)
            .cloned()
            .ok_or_else(|| OwnerLookupError::NotFound(post_id.to_string()))
    }
}
