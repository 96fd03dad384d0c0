//! UseCase: 参加者の切断処理

use std::sync::Arc;

use crate::domain::{Connection, MessagePusher, RoomDirectory, RoomId};

/// 参加者切断のユースケース
///
/// 何度呼んでも安全（冪等）。切断は他の参加者には通知しない。
pub struct DisconnectParticipantUseCase {
    room_directory: Arc<dyn RoomDirectory>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl DisconnectParticipantUseCase {
    pub fn new(
        room_directory: Arc<dyn RoomDirectory>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            room_directory,
            message_pusher,
        }
    }

    /// 全 Room から退出させ、送信チャンネルを解除する
    ///
    /// # Returns
    ///
    /// 退出した Room の一覧
    pub async fn execute(&self, connection: &Connection) -> Vec<RoomId> {
        let left = self.room_directory.leave_all(&connection.id).await;
        self.message_pusher.unregister_client(&connection.id).await;
        tracing::info!(
            "User '{}' disconnected ('{}'), left {} room(s)",
            connection.user.id,
            connection.id,
            left.len()
        );
        left
    }
}
