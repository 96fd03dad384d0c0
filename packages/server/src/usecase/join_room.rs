//! UseCase: Room への参加・退出
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - セッション Room への参加（メンバー一覧 + 履歴の返信、他メンバーへの通知）
//! - セッション Room からの退出
//! - チャレンジ Room への参加
//!
//! ### なぜこのテストが必要か
//! - 参加直後のクライアントは履歴とメンバーを一度に受け取って画面を組み立てる
//! - 履歴の読み出し失敗で参加自体が失敗してはいけない
//!
//! ### どのような状況を想定しているか
//! - 正常系：初回参加 / 再参加 / 退出
//! - 異常系：参加していない Room からの退出、ストア障害
//! - 競合：履歴の読み出し中に届いた発言

use std::sync::Arc;

use crate::domain::{
    ChallengeId, ChatMessage, Connection, DirectoryError, EphemeralStore, MessagePusher, RoomId,
    RoomDirectory, ServerEvent, SessionId,
};

use super::query::read_chat_history;

/// Room 参加・退出のユースケース
pub struct JoinRoomUseCase {
    room_directory: Arc<dyn RoomDirectory>,
    message_pusher: Arc<dyn MessagePusher>,
    store: Arc<dyn EphemeralStore>,
}

impl JoinRoomUseCase {
    pub fn new(
        room_directory: Arc<dyn RoomDirectory>,
        message_pusher: Arc<dyn MessagePusher>,
        store: Arc<dyn EphemeralStore>,
    ) -> Self {
        Self {
            room_directory,
            message_pusher,
            store,
        }
    }

    /// セッション Room に参加し、メンバー一覧とチャット履歴を返信する
    ///
    /// 履歴は参加した後に読む。参加後の発言はライブ配信で、読み出しより前に保存された発言は
    /// 履歴で届くため、どちらにも載らない発言はない（重複はクライアントが ID で除く）。
    pub async fn join_session(
        &self,
        connection: &Connection,
        session_id: &SessionId,
    ) -> Result<(), DirectoryError> {
        let room_id = RoomId::Session(session_id.clone());
        self.enter(connection, &room_id).await?;

        let history = match read_chat_history(self.store.as_ref(), session_id).await {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!(
                    "Chat history for '{}' unavailable, joining without it: {}",
                    room_id,
                    e
                );
                Vec::new()
            }
        };
        self.reply_joined(connection, room_id, history).await;
        Ok(())
    }

    /// チャレンジ Room に参加する（履歴は持たない）
    pub async fn join_challenge(
        &self,
        connection: &Connection,
        challenge_id: &ChallengeId,
    ) -> Result<(), DirectoryError> {
        let room_id = RoomId::Challenge(challenge_id.clone());
        self.enter(connection, &room_id).await?;
        self.reply_joined(connection, room_id, Vec::new()).await;
        Ok(())
    }

    /// セッション Room から退出し、残りのメンバーに通知する
    pub async fn leave_session(
        &self,
        connection: &Connection,
        session_id: &SessionId,
    ) -> Result<(), DirectoryError> {
        let room_id = RoomId::Session(session_id.clone());
        self.room_directory.leave(&room_id, &connection.id).await?;

        let left = ServerEvent::ParticipantLeft {
            room_id: room_id.clone(),
            user_id: connection.user.id.clone(),
        };
        self.room_directory.broadcast(&room_id, &left, None).await;
        self.reply(connection, &ServerEvent::RoomLeft { room_id }).await;
        Ok(())
    }

    /// Room に参加し、新規参加なら他のメンバーに通知する
    async fn enter(
        &self,
        connection: &Connection,
        room_id: &RoomId,
    ) -> Result<(), DirectoryError> {
        let newly_joined = self.room_directory.join(room_id, &connection.id).await?;

        if newly_joined {
            let joined = ServerEvent::ParticipantJoined {
                room_id: room_id.clone(),
                user: connection.user.clone(),
            };
            self.room_directory
                .broadcast(room_id, &joined, Some(&connection.id))
                .await;
        }
        Ok(())
    }

    async fn reply_joined(
        &self,
        connection: &Connection,
        room_id: RoomId,
        history: Vec<ChatMessage>,
    ) {
        let members = self.room_directory.member_profiles(&room_id).await;
        self.reply(
            connection,
            &ServerEvent::RoomJoined {
                room_id,
                members,
                history,
            },
        )
        .await;
    }

    async fn reply(&self, connection: &Connection, event: &ServerEvent) {
        if let Err(e) = self.message_pusher.push_to(&connection.id, event).await {
            tracing::warn!("Failed to reply to '{}': {}", connection.id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use crate::{
        domain::{
            MessageBody, MessageKind, StoreError, Timestamp, chat_history_key,
            repository::MockEphemeralStore,
        },
        infrastructure::{dto::websocket::OutboundMessage, repository::InMemoryEphemeralStore},
        usecase::{
            send_chat_message::SendChatMessageUseCase,
            test_support::{Fixture, drain, profile, session_id, session_room},
        },
    };

    /// `list_since` がスナップショットを取った後、解放されるまで返らないストア
    struct GatedStore {
        inner: InMemoryEphemeralStore,
        snapshot_taken: Notify,
        release: Notify,
    }

    #[async_trait]
    impl EphemeralStore for GatedStore {
        async fn append(&self, key: &str, value: String) -> Result<usize, StoreError> {
            self.inner.append(key, value).await
        }

        async fn append_with_ttl(
            &self,
            key: &str,
            value: String,
            ttl: Duration,
        ) -> Result<usize, StoreError> {
            self.inner.append_with_ttl(key, value, ttl).await
        }

        async fn trim_to_last(&self, key: &str, n: usize) -> Result<(), StoreError> {
            self.inner.trim_to_last(key, n).await
        }

        async fn list_since(&self, key: &str, start: usize) -> Result<Vec<String>, StoreError> {
            let snapshot = self.inner.list_since(key, start).await;
            self.snapshot_taken.notify_one();
            self.release.notified().await;
            snapshot
        }

        async fn expires_in(&self, key: &str) -> Result<Option<Duration>, StoreError> {
            self.inner.expires_in(key).await
        }
    }

    fn usecase(fixture: &Fixture, store: Arc<dyn EphemeralStore>) -> JoinRoomUseCase {
        JoinRoomUseCase::new(fixture.directory.clone(), fixture.pusher.clone(), store)
    }

    #[tokio::test]
    async fn test_join_session_replies_members_and_history() {
        // テスト項目: 参加者にメンバー一覧と履歴が返り、既存メンバーに参加通知が届く
        // given (前提条件):
        let fixture = Fixture::new();
        let store = Arc::new(InMemoryEphemeralStore::default());
        let earlier = ChatMessage::new(
            session_id("7"),
            &profile("coach"),
            MessageBody::new("Warm up first".to_string()).unwrap(),
            MessageKind::Text,
            Timestamp::new(1),
        );
        store
            .append(
                &chat_history_key(&session_id("7")),
                serde_json::to_string(&earlier).unwrap(),
            )
            .await
            .unwrap();
        let (coach, mut rx_coach) = fixture.connect("coach").await;
        let (alice, mut rx_alice) = fixture.connect("alice").await;
        let uc = usecase(&fixture, store);
        uc.join_session(&coach, &session_id("7")).await.unwrap();
        drain(&mut rx_coach);

        // when (操作):
        uc.join_session(&alice, &session_id("7")).await.unwrap();

        // then (期待する結果):
        let alice_frames = drain(&mut rx_alice);
        assert_eq!(alice_frames.len(), 1);
        match &alice_frames[0] {
            OutboundMessage::RoomJoined {
                room_id,
                members,
                history,
            } => {
                assert_eq!(room_id, "trainer-session:7");
                let ids: Vec<&str> = members.iter().map(|m| m.user_id.as_str()).collect();
                assert_eq!(ids, vec!["alice", "coach"]);
                assert_eq!(history.len(), 1);
                assert_eq!(history[0].body, "Warm up first");
            }
            other => panic!("unexpected frame: {:?}", other),
        }

        let coach_frames = drain(&mut rx_coach);
        assert_eq!(coach_frames.len(), 1);
        assert!(matches!(
            &coach_frames[0],
            OutboundMessage::ParticipantJoined { user, .. } if user.user_id == "alice"
        ));
    }

    #[tokio::test]
    async fn test_rejoin_does_not_notify_again() {
        // テスト項目: 既に参加済みの Room に再参加しても他メンバーへは通知しない
        // given (前提条件):
        let fixture = Fixture::new();
        let (coach, mut rx_coach) = fixture.connect("coach").await;
        let (alice, mut rx_alice) = fixture.connect("alice").await;
        let uc = usecase(&fixture, Arc::new(InMemoryEphemeralStore::default()));
        uc.join_session(&coach, &session_id("7")).await.unwrap();
        uc.join_session(&alice, &session_id("7")).await.unwrap();
        drain(&mut rx_coach);
        drain(&mut rx_alice);

        // when (操作):
        uc.join_session(&alice, &session_id("7")).await.unwrap();

        // then (期待する結果):
        assert!(drain(&mut rx_coach).is_empty());
        assert_eq!(drain(&mut rx_alice).len(), 1);
    }

    #[tokio::test]
    async fn test_join_session_with_store_unavailable() {
        // テスト項目: 履歴が読めなくても参加は成功し、空の履歴が返る
        // given (前提条件):
        let fixture = Fixture::new();
        let mut store = MockEphemeralStore::new();
        store
            .expect_list_since()
            .returning(|_, _| Err(StoreError::StoreUnavailable("down".to_string())));
        let (alice, mut rx_alice) = fixture.connect("alice").await;
        let uc = usecase(&fixture, Arc::new(store));

        // when (操作):
        let result = uc.join_session(&alice, &session_id("7")).await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert!(
            fixture
                .directory
                .members_of(&session_room("7"))
                .await
                .contains(&alice.id)
        );
        match &drain(&mut rx_alice)[0] {
            OutboundMessage::RoomJoined { history, .. } => assert!(history.is_empty()),
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_leave_session_notifies_remaining_members() {
        // テスト項目: 退出すると残りのメンバーに participant-left が届き、本人に room-left が返る
        // given (前提条件):
        let fixture = Fixture::new();
        let (coach, mut rx_coach) = fixture.connect("coach").await;
        let (alice, mut rx_alice) = fixture.connect("alice").await;
        fixture.join_session(&coach, "7").await;
        fixture.join_session(&alice, "7").await;
        let uc = usecase(&fixture, Arc::new(InMemoryEphemeralStore::default()));

        // when (操作):
        uc.leave_session(&alice, &session_id("7")).await.unwrap();

        // then (期待する結果):
        let coach_frames = drain(&mut rx_coach);
        assert!(matches!(
            &coach_frames[..],
            [OutboundMessage::ParticipantLeft { user_id, .. }] if user_id == "alice"
        ));
        let alice_frames = drain(&mut rx_alice);
        assert!(matches!(
            &alice_frames[..],
            [OutboundMessage::RoomLeft { room_id }] if room_id == "trainer-session:7"
        ));
    }

    #[tokio::test]
    async fn test_leave_session_not_joined() {
        // テスト項目: 参加していないセッションからの退出は NotAMember
        // given (前提条件):
        let fixture = Fixture::new();
        let (alice, _rx) = fixture.connect("alice").await;
        let uc = usecase(&fixture, Arc::new(InMemoryEphemeralStore::default()));

        // when (操作):
        let result = uc.leave_session(&alice, &session_id("7")).await;

        // then (期待する結果):
        assert!(matches!(result, Err(DirectoryError::NotAMember(_))));
    }

    #[tokio::test]
    async fn test_join_challenge_room() {
        // テスト項目: チャレンジ Room に参加できる
        // given (前提条件):
        let fixture = Fixture::new();
        let (alice, mut rx_alice) = fixture.connect("alice").await;
        let uc = usecase(&fixture, Arc::new(InMemoryEphemeralStore::default()));
        let challenge = ChallengeId::new("30-day-plank".to_string()).unwrap();

        // when (操作):
        uc.join_challenge(&alice, &challenge).await.unwrap();

        // then (期待する結果):
        assert!(
            fixture
                .directory
                .rooms_of(&alice.id)
                .await
                .contains(&RoomId::Challenge(challenge))
        );
        assert!(matches!(
            &drain(&mut rx_alice)[..],
            [OutboundMessage::RoomJoined { room_id, history, .. }]
                if room_id == "challenge:30-day-plank" && history.is_empty()
        ));
    }

    #[tokio::test]
    async fn test_message_sent_while_reading_history_reaches_joiner() {
        // テスト項目: 履歴の読み出し中に送られた発言も、参加者にライブで届く
        // given (前提条件):
        let fixture = Fixture::new();
        let store = Arc::new(GatedStore {
            inner: InMemoryEphemeralStore::new(fixture.clock.clone()),
            snapshot_taken: Notify::new(),
            release: Notify::new(),
        });
        let (coach, _rx_coach) = fixture.connect("coach").await;
        let (bob, mut rx_bob) = fixture.connect("bob").await;
        fixture.join_session(&coach, "42").await;
        let uc = usecase(&fixture, store.clone());
        let chat = SendChatMessageUseCase::new(
            fixture.directory.clone(),
            store.clone(),
            fixture.clock.clone(),
        );

        // when (操作): bob の履歴スナップショット取得後に coach が発言する
        let bob_session = session_id("42");
        let (joined, sent) = tokio::join!(uc.join_session(&bob, &bob_session), async {
            store.snapshot_taken.notified().await;
            let sent = chat
                .execute(
                    &coach,
                    session_id("42"),
                    MessageBody::new("Good set!".to_string()).unwrap(),
                    MessageKind::Text,
                )
                .await;
            store.release.notify_one();
            sent
        });

        // then (期待する結果):
        joined.unwrap();
        let sent = sent.unwrap();
        assert!(sent.persisted);
        let bob_frames = drain(&mut rx_bob);
        assert!(bob_frames.iter().any(|frame| matches!(
            frame,
            OutboundMessage::ChatMessage(dto) if dto.id == sent.message.id
        )));
        assert!(bob_frames.iter().any(|frame| matches!(
            frame,
            OutboundMessage::RoomJoined { history, .. } if history.is_empty()
        )));
    }
}
