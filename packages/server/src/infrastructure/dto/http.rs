//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

use super::websocket::{ChatMessageDto, HeartRateSampleDto, UserInfo};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomMembersDto {
    pub room_id: String,
    pub member_count: usize,
    pub members: Vec<UserInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatHistoryDto {
    pub session_id: String,
    pub messages: Vec<ChatMessageDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartRateHistoryDto {
    pub user_id: String,
    pub samples: Vec<HeartRateSampleDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponseDto {
    pub error: String,
}
