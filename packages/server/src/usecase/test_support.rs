//! UseCase テスト用の共通フィクスチャ

use std::{collections::HashMap, sync::Arc};

use coachlive_shared::time::{Clock, FixedClock};
use tokio::sync::mpsc;

use crate::{
    domain::{
        Connection, ConnectionId, MessagePusher, RoomDirectory, RoomId, SessionId, Timestamp,
        UserId, UserProfile,
    },
    infrastructure::{
        dto::websocket::OutboundMessage,
        message_pusher::WebSocketMessagePusher,
        post_owner::InMemoryPostOwnerResolver,
        repository::{InMemoryEphemeralStore, InMemoryRoomDirectory},
        scoring::HeuristicFormScorer,
    },
    usecase::RouteHandlers,
};

pub const NOW: i64 = 1_700_000_000_000;

pub struct Fixture {
    pub pusher: Arc<WebSocketMessagePusher>,
    pub directory: Arc<InMemoryRoomDirectory>,
    pub clock: Arc<dyn Clock>,
}

impl Fixture {
    pub fn new() -> Self {
        let pusher = Arc::new(WebSocketMessagePusher::default());
        let directory = Arc::new(InMemoryRoomDirectory::new(pusher.clone()));
        Self {
            pusher,
            directory,
            clock: Arc::new(FixedClock::new(NOW)),
        }
    }

    /// 送信チャンネルと個人 Room を持つ接続を作る
    pub async fn connect(&self, user_id: &str) -> (Connection, mpsc::UnboundedReceiver<String>) {
        let connection = Connection::new(
            ConnectionId::new(format!("conn-{}", user_id)).unwrap(),
            profile(user_id),
            Timestamp::new(NOW),
        );
        let (tx, rx) = mpsc::unbounded_channel();
        self.pusher.register_client(connection.id.clone(), tx).await;
        self.directory
            .register(connection.id.clone(), connection.user.clone())
            .await
            .unwrap();
        self.directory
            .join(&connection.personal_room(), &connection.id)
            .await
            .unwrap();
        (connection, rx)
    }

    /// インメモリ実装で組み立てたルーター用のユースケース一式
    pub fn handlers(&self) -> RouteHandlers {
        let owners = HashMap::from([("post-1".to_string(), profile("owner").id)]);
        RouteHandlers::new(
            self.directory.clone(),
            self.pusher.clone(),
            Arc::new(InMemoryEphemeralStore::new(self.clock.clone())),
            Arc::new(HeuristicFormScorer::new(self.clock.clone())),
            Arc::new(InMemoryPostOwnerResolver::new(owners)),
            self.clock.clone(),
        )
    }

    pub async fn join_session(&self, connection: &Connection, session_id: &str) {
        self.directory
            .join(&session_room(session_id), &connection.id)
            .await
            .unwrap();
    }
}

pub fn profile(user_id: &str) -> UserProfile {
    UserProfile {
        id: UserId::new(user_id.to_string()).unwrap(),
        name: user_id.to_uppercase(),
        avatar: None,
    }
}

pub fn session_id(id: &str) -> SessionId {
    SessionId::new(id.to_string()).unwrap()
}

pub fn session_room(id: &str) -> RoomId {
    RoomId::Session(session_id(id))
}

/// 受信済みのフレームを全て取り出す
pub fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<OutboundMessage> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.push(serde_json::from_str(&frame).unwrap());
    }
    frames
}
