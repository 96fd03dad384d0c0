//! WebSocket frame DTOs.
//!
//! Every frame is a JSON object tagged by `"type"` with a kebab-case event name.

use serde::{Deserialize, Serialize};

/// Chat message kind on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKindDto {
    #[default]
    Text,
    Voice,
    Image,
}

/// Frames sent by clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InboundMessage {
    JoinSessionRoom {
        session_id: String,
    },
    LeaveSessionRoom {
        session_id: String,
    },
    JoinChallengeRoom {
        challenge_id: String,
    },
    ChatMessage {
        session_id: String,
        body: String,
        #[serde(default)]
        kind: MessageKindDto,
    },
    HeartRateSample {
        bpm: u16,
        #[serde(default)]
        exercise_id: Option<String>,
    },
    FormAnalysis {
        exercise_id: String,
        #[serde(default)]
        form_payload: serde_json::Value,
    },
    LiveWorkoutShare {
        workout_id: String,
        current_exercise: String,
        progress: f64,
    },
    ChallengeProgressUpdate {
        challenge_id: String,
        progress: f64,
    },
    TypingIndicator {
        session_id: String,
        is_typing: bool,
    },
    LikePost {
        post_id: String,
    },
    Disconnect,
}

/// Public user information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub user_id: String,
    pub name: String,
    pub avatar: Option<String>,
}

/// Chat message on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessageDto {
    pub id: String,
    pub session_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_avatar: Option<String>,
    pub body: String,
    pub kind: MessageKindDto,
    pub timestamp: i64,
}

/// Heart-rate sample on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartRateSampleDto {
    pub user_id: String,
    pub bpm: u16,
    pub exercise_id: Option<String>,
    pub timestamp: i64,
}

/// Form analysis result on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormAnalysisResultDto {
    pub exercise_id: String,
    pub score: u8,
    pub feedback: String,
    pub suggestions: Vec<String>,
    pub timestamp: i64,
}

/// Frames sent to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum OutboundMessage {
    Connected {
        connection_id: String,
        user: UserInfo,
        personal_room: String,
    },
    RoomJoined {
        room_id: String,
        members: Vec<UserInfo>,
        history: Vec<ChatMessageDto>,
    },
    RoomLeft {
        room_id: String,
    },
    ParticipantJoined {
        room_id: String,
        user: UserInfo,
    },
    ParticipantLeft {
        room_id: String,
        user_id: String,
    },
    ChatMessage(ChatMessageDto),
    HeartRateRecorded {
        sample: HeartRateSampleDto,
        level: String,
    },
    HeartRateAlert {
        room_id: String,
        user_name: String,
        level: String,
        sample: HeartRateSampleDto,
    },
    FormAnalysisResult(FormAnalysisResultDto),
    FormAnalysisShared {
        room_id: String,
        user: UserInfo,
        exercise_id: String,
        score: u8,
        timestamp: i64,
    },
    LiveWorkoutUpdate {
        user: UserInfo,
        workout_id: String,
        current_exercise: String,
        progress: f64,
        timestamp: i64,
    },
    ChallengeProgress {
        challenge_id: String,
        user: UserInfo,
        progress: f64,
        timestamp: i64,
    },
    Typing {
        session_id: String,
        user: UserInfo,
        is_typing: bool,
    },
    PostLiked {
        post_id: String,
        liked_by: UserInfo,
        timestamp: i64,
    },
    Error {
        code: String,
        message: String,
    },
}
