//! 外部コラボレーターの trait 定義
//!
//! トークン検証、ユーザーディレクトリ、フォーム採点、投稿オーナー解決はこのコアの外にあり、
//! ここではインターフェースだけを定義します。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{
    entity::{FormAnalysisResult, UserProfile},
    error::{OwnerLookupError, ScoringError, TokenError, UserLookupError},
    value_object::UserId,
};

/// 検証済みトークン
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedToken {
    pub user_id: UserId,
    pub claims: serde_json::Value,
}

/// ユーザーディレクトリ上のユーザー
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    pub active: bool,
}

impl UserRecord {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            name: self.name.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

/// トークン検証器
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// 署名と有効期限を検証し、subject をユーザー ID として返す
    async fn verify(&self, token: &str) -> Result<VerifiedToken, TokenError>;
}

/// ユーザーディレクトリ
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// ユーザーを ID で検索。存在しなければ `Ok(None)`
    async fn find_by_id(&self, user_id: &UserId) -> Result<Option<UserRecord>, UserLookupError>;
}

/// フォーム採点サービス
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FormScorer: Send + Sync {
    async fn score(
        &self,
        exercise_id: &str,
        form_payload: &serde_json::Value,
    ) -> Result<FormAnalysisResult, ScoringError>;
}

/// 投稿 ID からオーナーを解決する
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostOwnerResolver: Send + Sync {
    async fn resolve_owner(&self, post_id: &str) -> Result<UserId, OwnerLookupError>;
}
