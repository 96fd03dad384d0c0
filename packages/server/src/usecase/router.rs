//! 接続ごとのメッセージルーター
//!
//! 1 本の接続から届いたイベントを順番に処理する状態機械です。
//!
//! ```text
//! Connected ⇄ InSession
//!     └──────────┴──> Disconnected（終端）
//! ```
//!
//! 同じ接続のイベントは `dispatch` の呼び出し順に処理されるため、
//! 送信元ごとの順序（FIFO）が保たれます。失敗は送信者にだけ `error` イベントとして返し、
//! 他の接続には影響させません。

use std::sync::Arc;

use coachlive_shared::time::Clock;

use crate::domain::{
    AnomalyDetector, ClientEvent, Connection, ConnectionState, DirectoryError, EphemeralStore,
    ErrorCode, FormScorer, MessagePusher, PostOwnerResolver, RoomDirectory, ServerEvent,
};

use super::{
    analyze_form::AnalyzeFormUseCase, disconnect_participant::DisconnectParticipantUseCase,
    join_room::JoinRoomUseCase, record_heart_rate::RecordHeartRateUseCase, relay::RelayUseCase,
    send_chat_message::SendChatMessageUseCase,
};

/// ルーターが呼び出すユースケース一式（全接続で共有）
#[derive(Clone)]
pub struct RouteHandlers {
    pub room_directory: Arc<dyn RoomDirectory>,
    pub message_pusher: Arc<dyn MessagePusher>,
    pub join_room: Arc<JoinRoomUseCase>,
    pub send_chat_message: Arc<SendChatMessageUseCase>,
    pub record_heart_rate: Arc<RecordHeartRateUseCase>,
    pub analyze_form: Arc<AnalyzeFormUseCase>,
    pub relay: Arc<RelayUseCase>,
    pub disconnect_participant: Arc<DisconnectParticipantUseCase>,
}

impl RouteHandlers {
    /// 共有状態と外部コラボレーターからユースケース一式を組み立てる
    pub fn new(
        room_directory: Arc<dyn RoomDirectory>,
        message_pusher: Arc<dyn MessagePusher>,
        store: Arc<dyn EphemeralStore>,
        scorer: Arc<dyn FormScorer>,
        post_owner_resolver: Arc<dyn PostOwnerResolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            join_room: Arc::new(JoinRoomUseCase::new(
                room_directory.clone(),
                message_pusher.clone(),
                store.clone(),
            )),
            send_chat_message: Arc::new(SendChatMessageUseCase::new(
                room_directory.clone(),
                store.clone(),
                clock.clone(),
            )),
            record_heart_rate: Arc::new(RecordHeartRateUseCase::new(
                room_directory.clone(),
                message_pusher.clone(),
                store,
                AnomalyDetector::default(),
                clock.clone(),
            )),
            analyze_form: Arc::new(AnalyzeFormUseCase::new(
                room_directory.clone(),
                message_pusher.clone(),
                scorer,
            )),
            relay: Arc::new(RelayUseCase::new(
                room_directory.clone(),
                post_owner_resolver,
                clock,
            )),
            disconnect_participant: Arc::new(DisconnectParticipantUseCase::new(
                room_directory.clone(),
                message_pusher.clone(),
            )),
            room_directory,
            message_pusher,
        }
    }
}

/// 1 本の接続に対応するルーター
pub struct MessageRouter {
    connection: Connection,
    state: ConnectionState,
    handlers: RouteHandlers,
}

impl MessageRouter {
    pub fn new(connection: Connection, handlers: RouteHandlers) -> Self {
        Self {
            connection,
            state: ConnectionState::Connected,
            handlers,
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// イベントを 1 件処理し、処理後の状態を返す
    pub async fn dispatch(&mut self, event: ClientEvent) -> ConnectionState {
        if self.state == ConnectionState::Disconnected {
            tracing::debug!(
                "Ignoring '{}' from disconnected '{}'",
                event.name(),
                self.connection.id
            );
            return self.state;
        }

        tracing::debug!("Routing '{}' from '{}'", event.name(), self.connection.id);
        let connection = &self.connection;
        let handlers = &self.handlers;

        match event {
            ClientEvent::JoinSessionRoom { session_id } => {
                let result = handlers.join_room.join_session(connection, &session_id).await;
                self.report_directory_result(result).await;
                self.refresh_state().await;
            }
            ClientEvent::LeaveSessionRoom { session_id } => {
                let result = handlers
                    .join_room
                    .leave_session(connection, &session_id)
                    .await;
                self.report_directory_result(result).await;
                self.refresh_state().await;
            }
            ClientEvent::JoinChallengeRoom { challenge_id } => {
                let result = handlers
                    .join_room
                    .join_challenge(connection, &challenge_id)
                    .await;
                self.report_directory_result(result).await;
                self.refresh_state().await;
            }
            ClientEvent::ChatMessage {
                session_id,
                body,
                kind,
            } => {
                let result = handlers
                    .send_chat_message
                    .execute(connection, session_id, body, kind)
                    .await;
                self.report_directory_result(result.map(|_| ())).await;
            }
            ClientEvent::HeartRateSample { bpm, exercise_id } => {
                handlers
                    .record_heart_rate
                    .execute(connection, bpm, exercise_id)
                    .await;
            }
            ClientEvent::FormAnalysis {
                exercise_id,
                form_payload,
            } => {
                if let Err(e) = handlers
                    .analyze_form
                    .execute(connection, &exercise_id, &form_payload)
                    .await
                {
                    tracing::info!("Form analysis for '{}' failed: {}", connection.id, e);
                    self.reject(ErrorCode::ScoringFailed, e.to_string()).await;
                }
            }
            ClientEvent::LiveWorkoutShare {
                workout_id,
                current_exercise,
                progress,
            } => {
                handlers
                    .relay
                    .share_live_workout(connection, workout_id, current_exercise, progress)
                    .await;
            }
            ClientEvent::ChallengeProgressUpdate {
                challenge_id,
                progress,
            } => {
                handlers
                    .relay
                    .update_challenge_progress(connection, challenge_id, progress)
                    .await;
            }
            ClientEvent::TypingIndicator {
                session_id,
                is_typing,
            } => {
                handlers
                    .relay
                    .relay_typing(connection, session_id, is_typing)
                    .await;
            }
            ClientEvent::LikePost { post_id } => {
                if let Err(e) = handlers.relay.notify_post_liked(connection, post_id).await {
                    self.reject(ErrorCode::PostOwnerNotFound, e.to_string()).await;
                }
            }
            ClientEvent::Disconnect => {
                self.close().await;
            }
        }

        self.state
    }

    /// 送信者にだけエラーを返す
    pub async fn reject(&self, code: ErrorCode, message: impl Into<String>) {
        let event = ServerEvent::error(code, message);
        if let Err(e) = self
            .handlers
            .message_pusher
            .push_to(&self.connection.id, &event)
            .await
        {
            tracing::debug!(
                "Could not deliver {} to '{}': {}",
                code.as_str(),
                self.connection.id,
                e
            );
        }
    }

    /// 接続を閉じる（冪等）
    pub async fn close(&mut self) {
        if self.state == ConnectionState::Disconnected {
            return;
        }
        self.handlers
            .disconnect_participant
            .execute(&self.connection)
            .await;
        self.state = ConnectionState::Disconnected;
    }

    async fn report_directory_result(&self, result: Result<(), DirectoryError>) {
        let Err(e) = result else {
            return;
        };
        let code = match e {
            DirectoryError::NotAMember(_) => ErrorCode::NotInRoom,
            DirectoryError::ConnectionNotRegistered(_)
            | DirectoryError::AlreadyRegistered(_)
            | DirectoryError::RoomCapacityExceeded(_) => ErrorCode::DirectoryError,
        };
        tracing::info!("Directory rejected '{}': {}", self.connection.id, e);
        self.reject(code, e.to_string()).await;
    }

    async fn refresh_state(&mut self) {
        let rooms = self
            .handlers
            .room_directory
            .rooms_of(&self.connection.id)
            .await;
        self.state = ConnectionState::from_rooms(&rooms);
    }
}
