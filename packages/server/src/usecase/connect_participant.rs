//! UseCase: 参加者の接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::execute() の成功・失敗パターン
//!
//! ### なぜこのテストが必要か
//! - 接続直後に個人 Room へ参加していないと、個人宛のイベントが届かない
//! - 同じユーザーの重複接続を拒否したとき、中途半端な登録が残ってはいけない
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規ユーザーの接続
//! - 異常系：同じユーザーが既に接続中

use std::sync::Arc;

use coachlive_shared::time::Clock;

use crate::domain::{
    Connection, ConnectionId, DirectoryError, MessagePusher, PusherChannel, RoomDirectory,
    ServerEvent, Timestamp, UserProfile,
};

use super::error::ConnectError;

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    room_directory: Arc<dyn RoomDirectory>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl ConnectParticipantUseCase {
    pub fn new(
        room_directory: Arc<dyn RoomDirectory>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            room_directory,
            message_pusher,
            clock,
        }
    }

    /// 認証済みユーザーの接続を登録し、個人 Room に参加させる
    ///
    /// # Arguments
    ///
    /// * `user` - 認証で得たユーザーのプロフィール
    /// * `sender` - この接続への送信チャンネル
    ///
    /// # Returns
    ///
    /// * `Ok(Connection)` - 接続成功。`connected` イベントを送信済み
    /// * `Err(ConnectError)` - 接続失敗。Directory と MessagePusher には何も残らない
    pub async fn execute(
        &self,
        user: UserProfile,
        sender: PusherChannel,
    ) -> Result<Connection, ConnectError> {
        // 1. 重複接続の早期チェック
        if self.room_directory.is_user_connected(&user.id).await {
            tracing::warn!("User '{}' is already connected", user.id);
            return Err(ConnectError::DuplicateConnection(user.id.to_string()));
        }

        let connection = Connection::new(
            ConnectionId::generate(),
            user,
            Timestamp::new(self.clock.now_millis()),
        );

        // 2. 送信チャンネルを登録（個人 Room 宛の配信に間に合わせる）
        self.message_pusher
            .register_client(connection.id.clone(), sender)
            .await;

        // 3. Directory に登録して個人 Room へ参加
        if let Err(e) = self.register_and_join_personal(&connection).await {
            self.room_directory.leave_all(&connection.id).await;
            self.message_pusher.unregister_client(&connection.id).await;
            return Err(e);
        }

        // 4. 接続完了を通知
        let event = ServerEvent::Connected {
            connection_id: connection.id.clone(),
            user: connection.user.clone(),
            personal_room: connection.personal_room(),
        };
        if let Err(e) = self.message_pusher.push_to(&connection.id, &event).await {
            tracing::warn!("Failed to send connected event to '{}': {}", connection.id, e);
        }

        tracing::info!(
            "User '{}' connected as '{}'",
            connection.user.id,
            connection.id
        );
        Ok(connection)
    }

    async fn register_and_join_personal(&self, connection: &Connection) -> Result<(), ConnectError> {
        self.room_directory
            .register(connection.id.clone(), connection.user.clone())
            .await
            .map_err(ConnectError::Directory)?;

        // 個人 Room の定員は 1 なので、同時接続の競合はここで弾かれる
        match self
            .room_directory
            .join(&connection.personal_room(), &connection.id)
            .await
        {
            Ok(_) => Ok(()),
            Err(DirectoryError::RoomCapacityExceeded(_)) => Err(ConnectError::DuplicateConnection(
                connection.user.id.to_string(),
            )),
            Err(e) => Err(ConnectError::Directory(e)),
        }
    }
}
