//! UseCase: チャットメッセージ送信
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendChatMessageUseCase::execute() の配信と永続化
//!
//! ### なぜこのテストが必要か
//! - 送信者を含む全メンバーに同一のメッセージ（同じ ID）が届くこと
//! - ストア障害時も配信は止めないこと（永続化だけが欠ける）
//!
//! ### どのような状況を想定しているか
//! - 正常系：2 人が参加するセッションでの送信
//! - 異常系：ストア障害、参加していないセッションへの送信

use std::sync::Arc;

use coachlive_shared::time::Clock;

use crate::domain::{
    CHAT_HISTORY_TTL, ChatMessage, Connection, ConnectionId, DirectoryError, EphemeralStore,
    MessageBody, MessageKind, RoomDirectory, RoomId, ServerEvent, SessionId, Timestamp,
    chat_history_key,
};

/// 送信結果
#[derive(Debug, Clone, PartialEq)]
pub struct ChatDelivery {
    pub message: ChatMessage,
    /// 実際に配信できた接続
    pub delivered: Vec<ConnectionId>,
    /// 履歴に保存できたかどうか
    pub persisted: bool,
}

/// チャットメッセージ送信のユースケース
pub struct SendChatMessageUseCase {
    room_directory: Arc<dyn RoomDirectory>,
    store: Arc<dyn EphemeralStore>,
    clock: Arc<dyn Clock>,
}

impl SendChatMessageUseCase {
    pub fn new(
        room_directory: Arc<dyn RoomDirectory>,
        store: Arc<dyn EphemeralStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            room_directory,
            store,
            clock,
        }
    }

    /// セッション Room の全メンバー（送信者を含む）にメッセージを配信し、履歴に追記する
    ///
    /// # Returns
    ///
    /// * `Ok(ChatDelivery)` - 配信成功（永続化の成否は `persisted`）
    /// * `Err(DirectoryError::NotAMember)` - 送信者がセッションに参加していない
    pub async fn execute(
        &self,
        connection: &Connection,
        session_id: SessionId,
        body: MessageBody,
        kind: MessageKind,
    ) -> Result<ChatDelivery, DirectoryError> {
        let room_id = RoomId::Session(session_id.clone());
        if !self
            .room_directory
            .rooms_of(&connection.id)
            .await
            .contains(&room_id)
        {
            return Err(DirectoryError::NotAMember(room_id.to_string()));
        }

        let message = ChatMessage::new(
            session_id,
            &connection.user,
            body,
            kind,
            Timestamp::new(self.clock.now_millis()),
        );

        // 1. 配信（永続化の成否に関わらず行う）
        let delivered = self
            .room_directory
            .broadcast(&room_id, &ServerEvent::ChatMessage(message.clone()), None)
            .await;

        // 2. 履歴に追記し、TTL をリセット
        let persisted = self.persist(&message).await;

        tracing::debug!(
            "Chat message '{}' in '{}' delivered to {} connection(s)",
            message.id,
            room_id,
            delivered.len()
        );
        Ok(ChatDelivery {
            message,
            delivered,
            persisted,
        })
    }

    async fn persist(&self, message: &ChatMessage) -> bool {
        let key = chat_history_key(&message.session_id);
        let serialized = match serde_json::to_string(message) {
            Ok(serialized) => serialized,
            Err(e) => {
                tracing::error!("Failed to serialize chat message '{}': {}", message.id, e);
                return false;
            }
        };
        match self
            .store
            .append_with_ttl(&key, serialized, CHAT_HISTORY_TTL)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(
                    "Chat history write to '{}' failed, message '{}' was delivered but not stored: {}",
                    key,
                    message.id,
                    e
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{StoreError, repository::MockEphemeralStore},
        infrastructure::{dto::websocket::OutboundMessage, repository::InMemoryEphemeralStore},
        usecase::test_support::{Fixture, NOW, drain, session_id},
    };

    fn body(text: &str) -> MessageBody {
        MessageBody::new(text.to_string()).unwrap()
    }

    fn chat_id(frame: &OutboundMessage) -> String {
        match frame {
            OutboundMessage::ChatMessage(dto) => dto.id.clone(),
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_chat_message_reaches_everyone_and_is_stored() {
        // テスト項目: 送信者を含む全メンバーに同じメッセージが届き、履歴に 1 件追記される
        // given (前提条件):
        let fixture = Fixture::new();
        let store = Arc::new(InMemoryEphemeralStore::new(fixture.clock.clone()));
        let (a, mut rx_a) = fixture.connect("a").await;
        let (b, mut rx_b) = fixture.connect("b").await;
        let (_c, mut rx_c) = fixture.connect("c").await;
        fixture.join_session(&a, "42").await;
        fixture.join_session(&b, "42").await;
        drain(&mut rx_a);
        drain(&mut rx_b);
        let uc = SendChatMessageUseCase::new(
            fixture.directory.clone(),
            store.clone(),
            fixture.clock.clone(),
        );

        // when (操作):
        let delivery = uc
            .execute(&a, session_id("42"), body("Good set!"), MessageKind::Text)
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(delivery.delivered.len(), 2);
        assert!(delivery.persisted);
        assert_eq!(delivery.message.timestamp, Timestamp::new(NOW));

        let frames_a = drain(&mut rx_a);
        let frames_b = drain(&mut rx_b);
        assert_eq!(frames_a.len(), 1);
        assert_eq!(frames_b.len(), 1);
        assert_eq!(chat_id(&frames_a[0]), delivery.message.id);
        assert_eq!(chat_id(&frames_b[0]), delivery.message.id);
        assert!(drain(&mut rx_c).is_empty());

        let stored = store
            .list_since(&chat_history_key(&session_id("42")), 0)
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        let restored: ChatMessage = serde_json::from_str(&stored[0]).unwrap();
        assert_eq!(restored, delivery.message);
        let ttl = store
            .expires_in(&chat_history_key(&session_id("42")))
            .await
            .unwrap();
        assert_eq!(ttl, Some(CHAT_HISTORY_TTL));
    }

    #[tokio::test]
    async fn test_send_chat_message_delivers_even_if_store_fails() {
        // テスト項目: ストアが使えなくても配信は行われ、永続化失敗として報告される
        // given (前提条件):
        let fixture = Fixture::new();
        let mut store = MockEphemeralStore::new();
        store
            .expect_append_with_ttl()
            .times(1)
            .returning(|_, _, _| Err(StoreError::StoreUnavailable("down".to_string())));
        let (a, mut rx_a) = fixture.connect("a").await;
        let (b, mut rx_b) = fixture.connect("b").await;
        fixture.join_session(&a, "42").await;
        fixture.join_session(&b, "42").await;
        drain(&mut rx_a);
        drain(&mut rx_b);
        let uc = SendChatMessageUseCase::new(
            fixture.directory.clone(),
            Arc::new(store),
            fixture.clock.clone(),
        );

        // when (操作):
        let delivery = uc
            .execute(&a, session_id("42"), body("Good set!"), MessageKind::Text)
            .await
            .unwrap();

        // then (期待する結果):
        assert!(!delivery.persisted);
        assert_eq!(delivery.delivered.len(), 2);
        assert_eq!(drain(&mut rx_a).len(), 1);
        assert_eq!(drain(&mut rx_b).len(), 1);
    }

    #[tokio::test]
    async fn test_send_chat_message_requires_membership() {
        // テスト項目: 参加していないセッションには送信できず、何も保存されない
        // given (前提条件):
        let fixture = Fixture::new();
        let mut store = MockEphemeralStore::new();
        store.expect_append_with_ttl().never();
        let (a, _rx_a) = fixture.connect("a").await;
        let uc = SendChatMessageUseCase::new(
            fixture.directory.clone(),
            Arc::new(store),
            fixture.clock.clone(),
        );

        // when (操作):
        let result = uc
            .execute(&a, session_id("42"), body("hello?"), MessageKind::Text)
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(DirectoryError::NotAMember(_))));
    }
}
