//! UseCase: 接続認証
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - AuthenticateConnectionUseCase::execute() の成功・失敗パターン
//!
//! ### なぜこのテストが必要か
//! - 認証に失敗した接続は Room Directory に一切状態を作ってはならない
//! - 外部呼び出しのタイムアウトは InvalidCredential として扱う
//!
//! ### どのような状況を想定しているか
//! - 正常系：有効なトークン + アクティブなユーザー
//! - 異常系：資格情報なし / 検証失敗 / ユーザー不在 / 無効化されたユーザー / タイムアウト

use std::{sync::Arc, time::Duration};

use crate::domain::{AuthError, TokenVerifier, UserDirectory, UserProfile};

/// 認証の既定タイムアウト
pub const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(5);

/// 接続認証のユースケース
///
/// 状態を持たないため、独立した接続から並行に呼び出してよい。
pub struct AuthenticateConnectionUseCase {
    token_verifier: Arc<dyn TokenVerifier>,
    user_directory: Arc<dyn UserDirectory>,
    timeout: Duration,
}

impl AuthenticateConnectionUseCase {
    pub fn new(
        token_verifier: Arc<dyn TokenVerifier>,
        user_directory: Arc<dyn UserDirectory>,
        timeout: Duration,
    ) -> Self {
        Self {
            token_verifier,
            user_directory,
            timeout,
        }
    }

    /// 資格情報を検証し、接続ユーザーのプロフィールを返す
    ///
    /// # Arguments
    ///
    /// * `credential` - 接続時に提示された bearer トークン
    ///
    /// # Returns
    ///
    /// * `Ok(UserProfile)` - 認証成功
    /// * `Err(AuthError)` - 認証失敗（タイムアウトは `InvalidCredential`）
    pub async fn execute(&self, credential: Option<&str>) -> Result<UserProfile, AuthError> {
        let token = credential
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingCredential)?;

        match tokio::time::timeout(self.timeout, self.verify_and_lookup(token)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("Authentication timed out after {:?}", self.timeout);
                Err(AuthError::InvalidCredential)
            }
        }
    }

    async fn verify_and_lookup(&self, token: &str) -> Result<UserProfile, AuthError> {
        let verified = self.token_verifier.verify(token).await.map_err(|e| {
            tracing::info!("Rejected credential: {}", e);
            AuthError::InvalidCredential
        })?;

        let record = self
            .user_directory
            .find_by_id(&verified.user_id)
            .await
            .map_err(|e| {
                tracing::warn!("User lookup for '{}' failed: {}", verified.user_id, e);
                AuthError::UserNotFound(verified.user_id.to_string())
            })?
            .ok_or_else(|| AuthError::UserNotFound(verified.user_id.to_string()))?;

        if !record.active {
            return Err(AuthError::UserInactive(record.id.to_string()));
        }

        Ok(record.profile())
    }
}
