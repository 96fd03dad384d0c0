//! エンティティ
//!
//! 接続、チャットメッセージ、心拍サンプル、フォーム分析結果を表現します。

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    error::ValidationError,
    value_object::{
        Bpm, ConnectionId, MessageBody, MessageKind, RoomId, SessionId, Timestamp, UserId,
    },
};

/// 認証時に取得したユーザーの表示情報（非正規化して接続に保持する）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub avatar: Option<String>,
}

/// ライブ接続 1 本
///
/// Room の所属は Room Directory が一元管理する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub user: UserProfile,
    pub connected_at: Timestamp,
}

impl Connection {
    pub fn new(id: ConnectionId, user: UserProfile, connected_at: Timestamp) -> Self {
        Self {
            id,
            user,
            connected_at,
        }
    }

    /// 接続時に自動参加する個人 Room
    pub fn personal_room(&self) -> RoomId {
        RoomId::Personal(self.user.id.clone())
    }
}

/// 接続ごとのルーティング状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// 認証済み。個人 Room 以外には未参加
    Connected,
    /// セッション Room かチャレンジ Room に 1 つ以上参加中
    InSession,
    /// 終端状態。以降のイベントは処理しない
    Disconnected,
}

impl ConnectionState {
    /// 所属 Room の集合から状態を導出
    pub fn from_rooms(rooms: &HashSet<RoomId>) -> Self {
        if rooms.iter().any(|room| !matches!(room, RoomId::Personal(_))) {
            ConnectionState::InSession
        } else {
            ConnectionState::Connected
        }
    }
}

/// チャットメッセージ（不変）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub session_id: SessionId,
    pub sender_id: UserId,
    pub sender_name: String,
    pub sender_avatar: Option<String>,
    pub body: MessageBody,
    pub kind: MessageKind,
    pub timestamp: Timestamp,
}

impl ChatMessage {
    /// 新しいメッセージを作成（ID は時刻ベースの UUIDv7）
    pub fn new(
        session_id: SessionId,
        sender: &UserProfile,
        body: MessageBody,
        kind: MessageKind,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            session_id,
            sender_id: sender.id.clone(),
            sender_name: sender.name.clone(),
            sender_avatar: sender.avatar.clone(),
            body,
            kind,
            timestamp,
        }
    }
}

/// 心拍サンプル
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartRateSample {
    pub user_id: UserId,
    pub bpm: Bpm,
    pub exercise_id: Option<String>,
    pub timestamp: Timestamp,
}

/// フォーム分析結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormAnalysisResult {
    pub exercise_id: String,
    score: u8,
    pub feedback: String,
    pub suggestions: Vec<String>,
    pub timestamp: Timestamp,
}

impl FormAnalysisResult {
    pub const MAX_SCORE: u8 = 100;

    pub fn new(
        exercise_id: String,
        score: u8,
        feedback: String,
        suggestions: Vec<String>,
        timestamp: Timestamp,
    ) -> Result<Self, ValidationError> {
        if score > Self::MAX_SCORE {
            return Err(ValidationError::OutOfRange(
                "score",
                0,
                Self::MAX_SCORE as i64,
            ));
        }
        Ok(Self {
            exercise_id,
            score,
            feedback,
            suggestions,
            timestamp,
        })
    }

    pub fn score(&self) -> u8 {
        self.score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str) -> UserProfile {
        UserProfile {
            id: UserId::new(id.to_string()).unwrap(),
            name: id.to_uppercase(),
            avatar: None,
        }
    }

    #[test]
    fn test_connection_state_from_rooms() {
        // テスト項目: 所属 Room から接続状態が導出される
        // given (前提条件):
        let personal = RoomId::Personal(UserId::new("a".to_string()).unwrap());
        let session = RoomId::Session(SessionId::new("42".to_string()).unwrap());

        let only_personal: HashSet<RoomId> = [personal.clone()].into_iter().collect();
        let with_session: HashSet<RoomId> = [personal, session].into_iter().collect();

        // then (期待する結果):
        assert_eq!(
            ConnectionState::from_rooms(&only_personal),
            ConnectionState::Connected
        );
        assert_eq!(
            ConnectionState::from_rooms(&with_session),
            ConnectionState::InSession
        );
        assert_eq!(
            ConnectionState::from_rooms(&HashSet::new()),
            ConnectionState::Connected
        );
    }

    #[test]
    fn test_chat_message_ids_are_unique_and_ordered() {
        // テスト項目: 連続して作ったメッセージの ID は一意で時系列順になる
        // given (前提条件):
        let sender = profile("a");
        let session = SessionId::new("42".to_string()).unwrap();
        let body = MessageBody::new("Good set!".to_string()).unwrap();

        // when (操作):
        let first = ChatMessage::new(
            session.clone(),
            &sender,
            body.clone(),
            MessageKind::Text,
            Timestamp::new(1),
        );
        let second = ChatMessage::new(session, &sender, body, MessageKind::Text, Timestamp::new(2));

        // then (期待する結果):
        assert_ne!(first.id, second.id);
        assert!(first.id < second.id);
        assert_eq!(first.sender_name, "A");
    }

    #[test]
    fn test_form_analysis_score_bound() {
        // テスト項目: スコアが 100 を超えるとエラーになる
        // when (操作):
        let over = FormAnalysisResult::new(
            "squat".to_string(),
            101,
            String::new(),
            vec![],
            Timestamp::new(0),
        );
        let ok = FormAnalysisResult::new(
            "squat".to_string(),
            100,
            String::new(),
            vec![],
            Timestamp::new(0),
        );

        // then (期待する結果):
        assert!(over.is_err());
        assert_eq!(ok.unwrap().score(), 100);
    }
}
