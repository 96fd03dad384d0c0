//! Shared application state.

use std::sync::Arc;

use crate::usecase::{
    GetChatHistoryUseCase, GetHeartRateHistoryUseCase, GetRoomMembersUseCase, SessionHub,
};

/// Shared application state
pub struct AppState {
    /// SessionHub（WebSocket 接続の入口）
    pub session_hub: Arc<SessionHub>,
    /// GetRoomMembersUseCase（Room メンバー取得のユースケース）
    pub get_room_members_usecase: Arc<GetRoomMembersUseCase>,
    /// GetChatHistoryUseCase（チャット履歴取得のユースケース）
    pub get_chat_history_usecase: Arc<GetChatHistoryUseCase>,
    /// GetHeartRateHistoryUseCase（心拍履歴取得のユースケース）
    pub get_heart_rate_history_usecase: Arc<GetHeartRateHistoryUseCase>,
}
