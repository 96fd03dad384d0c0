//! UseCase: 参照系（Room メンバー、チャット履歴、心拍履歴）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - 各クエリが Directory / Ephemeral Store の内容をそのまま返すこと
//! - チャット履歴はセッション Room に接続中のメンバーだけ、心拍履歴は本人だけが読めること
//!
//! ### なぜこのテストが必要か
//! - 壊れたエントリが 1 件あるだけで履歴全体が読めなくなるのを防ぐ
//!
//! ### どのような状況を想定しているか
//! - 正常系：履歴あり / 履歴なし
//! - 異常系：壊れたエントリ、ストア障害、権限のないユーザーからの参照

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::{
    domain::{
        ChatMessage, EphemeralStore, HeartRateSample, RoomDirectory, RoomId, SessionId,
        StoreError, UserId, UserProfile, chat_history_key, heart_rate_key,
    },
    usecase::error::QueryError,
};

/// リストの全要素を古い順にデコードする。壊れた要素は読み飛ばす
async fn read_list<T: DeserializeOwned>(
    store: &dyn EphemeralStore,
    key: &str,
) -> Result<Vec<T>, StoreError> {
    let entries = store.list_since(key, 0).await?;
    Ok(entries
        .iter()
        .filter_map(|raw| match serde_json::from_str(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Skipping corrupt entry in '{}': {}", key, e);
                None
            }
        })
        .collect())
}

/// セッションのチャット履歴を古い順に読み出す
pub(crate) async fn read_chat_history(
    store: &dyn EphemeralStore,
    session_id: &SessionId,
) -> Result<Vec<ChatMessage>, StoreError> {
    read_list(store, &chat_history_key(session_id)).await
}

/// Room メンバー取得のユースケース
pub struct GetRoomMembersUseCase {
    room_directory: Arc<dyn RoomDirectory>,
}

impl GetRoomMembersUseCase {
    pub fn new(room_directory: Arc<dyn RoomDirectory>) -> Self {
        Self { room_directory }
    }

    /// Room のメンバー一覧（存在しない Room は空）
    pub async fn execute(&self, room_id: &RoomId) -> Vec<UserProfile> {
        self.room_directory.member_profiles(room_id).await
    }
}

/// チャット履歴取得のユースケース
///
/// 履歴を読めるのはセッション Room に接続中のメンバーだけ
pub struct GetChatHistoryUseCase {
    room_directory: Arc<dyn RoomDirectory>,
    store: Arc<dyn EphemeralStore>,
}

impl GetChatHistoryUseCase {
    pub fn new(room_directory: Arc<dyn RoomDirectory>, store: Arc<dyn EphemeralStore>) -> Self {
        Self {
            room_directory,
            store,
        }
    }

    pub async fn execute(
        &self,
        requester: &UserId,
        session_id: &SessionId,
    ) -> Result<Vec<ChatMessage>, QueryError> {
        let room_id = RoomId::Session(session_id.clone());
        let is_member = self
            .room_directory
            .member_profiles(&room_id)
            .await
            .iter()
            .any(|member| &member.id == requester);
        if !is_member {
            return Err(QueryError::Forbidden {
                requester: requester.to_string(),
                resource: room_id.to_string(),
            });
        }

        Ok(read_chat_history(self.store.as_ref(), session_id).await?)
    }
}

/// 心拍履歴取得のユースケース
///
/// 心拍履歴は本人だけが読める
pub struct GetHeartRateHistoryUseCase {
    store: Arc<dyn EphemeralStore>,
}

impl GetHeartRateHistoryUseCase {
    pub fn new(store: Arc<dyn EphemeralStore>) -> Self {
        Self { store }
    }

    /// 直近のサンプル（最大 100 件）を古い順に返す
    pub async fn execute(
        &self,
        requester: &UserId,
        user_id: &UserId,
    ) -> Result<Vec<HeartRateSample>, QueryError> {
        if requester != user_id {
            return Err(QueryError::Forbidden {
                requester: requester.to_string(),
                resource: heart_rate_key(user_id),
            });
        }

        Ok(read_list(self.store.as_ref(), &heart_rate_key(user_id)).await?)
    }
}
