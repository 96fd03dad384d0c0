//! MessagePusher trait 定義
//!
//! クライアントへのイベント送信を抽象化します。
//! UseCase 層と Room Directory はこの trait に依存し、WebSocket などの具体的な実装には依存しない。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{error::MessagePushError, event::ServerEvent, value_object::ConnectionId};

/// 接続ごとの送信チャンネル（シリアライズ済みのフレームを流す）
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続の送信チャンネルを登録
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// 接続の送信チャンネルを登録解除
    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// 特定の接続にイベントを送信
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: &ServerEvent,
    ) -> Result<(), MessagePushError>;

    /// 複数の接続にイベントを送信（一部の失敗は許容）。実際に送れた接続を返す
    async fn broadcast(&self, targets: &[ConnectionId], event: &ServerEvent) -> Vec<ConnectionId>;
}
