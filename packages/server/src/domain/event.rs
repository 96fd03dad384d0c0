//! 接続単位で流れるイベント
//!
//! `ClientEvent` はクライアントから届くイベント、`ServerEvent` はクライアントへ届けるイベント。
//! いずれも閉じた列挙型で、ルーターは文字列ではなくバリアントでディスパッチする。

use super::{
    anomaly::AlertLevel,
    entity::{ChatMessage, FormAnalysisResult, HeartRateSample, UserProfile},
    value_object::{
        Bpm, ChallengeId, ConnectionId, MessageBody, MessageKind, RoomId, SessionId, Timestamp,
        UserId,
    },
};

/// クライアントからのイベント
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    JoinSessionRoom {
        session_id: SessionId,
    },
    LeaveSessionRoom {
        session_id: SessionId,
    },
    JoinChallengeRoom {
        challenge_id: ChallengeId,
    },
    ChatMessage {
        session_id: SessionId,
        body: MessageBody,
        kind: MessageKind,
    },
    HeartRateSample {
        bpm: Bpm,
        exercise_id: Option<String>,
    },
    FormAnalysis {
        exercise_id: String,
        form_payload: serde_json::Value,
    },
    LiveWorkoutShare {
        workout_id: String,
        current_exercise: String,
        progress: f64,
    },
    ChallengeProgressUpdate {
        challenge_id: ChallengeId,
        progress: f64,
    },
    TypingIndicator {
        session_id: SessionId,
        is_typing: bool,
    },
    LikePost {
        post_id: String,
    },
    Disconnect,
}

impl ClientEvent {
    /// ログ用のイベント名
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::JoinSessionRoom { .. } => "join-session-room",
            ClientEvent::LeaveSessionRoom { .. } => "leave-session-room",
            ClientEvent::JoinChallengeRoom { .. } => "join-challenge-room",
            ClientEvent::ChatMessage { .. } => "chat-message",
            ClientEvent::HeartRateSample { .. } => "heart-rate-sample",
            ClientEvent::FormAnalysis { .. } => "form-analysis",
            ClientEvent::LiveWorkoutShare { .. } => "live-workout-share",
            ClientEvent::ChallengeProgressUpdate { .. } => "challenge-progress-update",
            ClientEvent::TypingIndicator { .. } => "typing-indicator",
            ClientEvent::LikePost { .. } => "like-post",
            ClientEvent::Disconnect => "disconnect",
        }
    }
}

/// クライアントに返すエラーの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidMessage,
    DirectoryError,
    NotInRoom,
    ScoringFailed,
    PostOwnerNotFound,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidMessage => "invalid-message",
            ErrorCode::DirectoryError => "directory-error",
            ErrorCode::NotInRoom => "not-in-room",
            ErrorCode::ScoringFailed => "scoring-failed",
            ErrorCode::PostOwnerNotFound => "post-owner-not-found",
        }
    }
}

/// クライアントへ届けるイベント
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    Connected {
        connection_id: ConnectionId,
        user: UserProfile,
        personal_room: RoomId,
    },
    RoomJoined {
        room_id: RoomId,
        members: Vec<UserProfile>,
        history: Vec<ChatMessage>,
    },
    RoomLeft {
        room_id: RoomId,
    },
    ParticipantJoined {
        room_id: RoomId,
        user: UserProfile,
    },
    ParticipantLeft {
        room_id: RoomId,
        user_id: UserId,
    },
    ChatMessage(ChatMessage),
    HeartRateRecorded {
        sample: HeartRateSample,
        level: AlertLevel,
    },
    HeartRateAlert {
        room_id: RoomId,
        user_name: String,
        level: AlertLevel,
        sample: HeartRateSample,
    },
    FormAnalysisResult(FormAnalysisResult),
    FormAnalysisShared {
        room_id: RoomId,
        user: UserProfile,
        exercise_id: String,
        score: u8,
        timestamp: Timestamp,
    },
    LiveWorkoutUpdate {
        user: UserProfile,
        workout_id: String,
        current_exercise: String,
        progress: f64,
        timestamp: Timestamp,
    },
    ChallengeProgress {
        challenge_id: ChallengeId,
        user: UserProfile,
        progress: f64,
        timestamp: Timestamp,
    },
    Typing {
        session_id: SessionId,
        user: UserProfile,
        is_typing: bool,
    },
    PostLiked {
        post_id: String,
        liked_by: UserProfile,
        timestamp: Timestamp,
    },
    Error {
        code: ErrorCode,
        message: String,
    },
}

impl ServerEvent {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        ServerEvent::Error {
            code,
            message: message.into(),
        }
    }
}
