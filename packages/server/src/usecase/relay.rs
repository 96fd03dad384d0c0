//! UseCase: 中継系イベント（ライブワークアウト共有、チャレンジ進捗、入力中表示、いいね通知）
//!
//! いずれも保存を伴わず、受け取ったイベントを変換して配信するだけです。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - 各イベントの配信先（全接続 / チャレンジ Room / セッション Room / 個人 Room）
//!
//! ### なぜこのテストが必要か
//! - 配信先の取り違えは、本来見えてはいけない相手への誤配信になる
//!
//! ### どのような状況を想定しているか
//! - 正常系：各イベントの配信
//! - 異常系：投稿者が解決できない、参加していないセッションへの入力中表示

use std::sync::Arc;

use coachlive_shared::time::Clock;

use crate::domain::{
    ChallengeId, Connection, ConnectionId, OwnerLookupError, PostOwnerResolver, RoomDirectory,
    RoomId, ServerEvent, SessionId, Timestamp,
};

/// 中継系イベントのユースケース
pub struct RelayUseCase {
    room_directory: Arc<dyn RoomDirectory>,
    post_owner_resolver: Arc<dyn PostOwnerResolver>,
    clock: Arc<dyn Clock>,
}

impl RelayUseCase {
    pub fn new(
        room_directory: Arc<dyn RoomDirectory>,
        post_owner_resolver: Arc<dyn PostOwnerResolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            room_directory,
            post_owner_resolver,
            clock,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    /// ライブワークアウトの状況を送信者以外の全接続に共有する
    ///
    /// 配信先はフォロワーではなく全接続で、コストは接続総数に比例する。フォロー関係で
    /// 絞り込む場合は、ここで `broadcast_all` の代わりにフォロワーの個人 Room へ配信する。
    pub async fn share_live_workout(
        &self,
        connection: &Connection,
        workout_id: String,
        current_exercise: String,
        progress: f64,
    ) -> Vec<ConnectionId> {
        let event = ServerEvent::LiveWorkoutUpdate {
            user: connection.user.clone(),
            workout_id,
            current_exercise,
            progress,
            timestamp: self.now(),
        };
        self.room_directory
            .broadcast_all(&event, Some(&connection.id))
            .await
    }

    /// チャレンジの進捗をチャレンジ Room のメンバーに配信する
    pub async fn update_challenge_progress(
        &self,
        connection: &Connection,
        challenge_id: ChallengeId,
        progress: f64,
    ) -> Vec<ConnectionId> {
        let room_id = RoomId::Challenge(challenge_id.clone());
        let event = ServerEvent::ChallengeProgress {
            challenge_id,
            user: connection.user.clone(),
            progress,
            timestamp: self.now(),
        };
        self.room_directory.broadcast(&room_id, &event, None).await
    }

    /// 入力中表示をセッション Room の他のメンバーに中継する
    ///
    /// 参加していないセッションへの入力中表示は黙って捨てる。
    pub async fn relay_typing(
        &self,
        connection: &Connection,
        session_id: SessionId,
        is_typing: bool,
    ) -> Vec<ConnectionId> {
        let room_id = RoomId::Session(session_id.clone());
        if !self
            .room_directory
            .rooms_of(&connection.id)
            .await
            .contains(&room_id)
        {
            tracing::debug!(
                "Dropping typing indicator from '{}' for '{}': not a member",
                connection.id,
                room_id
            );
            return Vec::new();
        }

        let event = ServerEvent::Typing {
            session_id,
            user: connection.user.clone(),
            is_typing,
        };
        self.room_directory
            .broadcast(&room_id, &event, Some(&connection.id))
            .await
    }

    /// 投稿へのいいねを投稿者の個人 Room に通知する
    ///
    /// 自分の投稿へのいいねは通知しない。
    pub async fn notify_post_liked(
        &self,
        connection: &Connection,
        post_id: String,
    ) -> Result<Vec<ConnectionId>, OwnerLookupError> {
        let owner = self.post_owner_resolver.resolve_owner(&post_id).await?;
        if owner == connection.user.id {
            return Ok(Vec::new());
        }

        let event = ServerEvent::PostLiked {
            post_id,
            liked_by: connection.user.clone(),
            timestamp: self.now(),
        };
        Ok(self
            .room_directory
            .broadcast(&RoomId::Personal(owner), &event, None)
            .await)
    }
}
