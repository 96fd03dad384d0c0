//! UseCase: 心拍サンプルの記録と異常通知
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - リングバッファへの記録（常に直近 100 件）
//! - 異常時にセッション Room へ通知が届くこと
//!
//! ### なぜこのテストが必要か
//! - 心拍の異常はトレーナーが即座に知る必要がある
//! - 書き込みに失敗しても trim は必ず試みること
//!
//! ### どのような状況を想定しているか
//! - 正常系：正常値 / Warning / Critical
//! - 異常系：ストア障害

use std::sync::Arc;

use coachlive_shared::time::Clock;

use crate::domain::{
    AlertLevel, AnomalyDetector, Bpm, Connection, EphemeralStore, HEART_RATE_BUFFER_LEN,
    HeartRateSample, MessagePusher, RoomDirectory, RoomId, ServerEvent, Timestamp, heart_rate_key,
};

/// 記録結果
#[derive(Debug, Clone, PartialEq)]
pub struct HeartRateOutcome {
    pub sample: HeartRateSample,
    pub level: AlertLevel,
    /// 異常通知を配信したセッション Room
    pub alerted_rooms: Vec<RoomId>,
}

/// 心拍記録のユースケース
pub struct RecordHeartRateUseCase {
    room_directory: Arc<dyn RoomDirectory>,
    message_pusher: Arc<dyn MessagePusher>,
    store: Arc<dyn EphemeralStore>,
    detector: AnomalyDetector,
    clock: Arc<dyn Clock>,
}

impl RecordHeartRateUseCase {
    pub fn new(
        room_directory: Arc<dyn RoomDirectory>,
        message_pusher: Arc<dyn MessagePusher>,
        store: Arc<dyn EphemeralStore>,
        detector: AnomalyDetector,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            room_directory,
            message_pusher,
            store,
            detector,
            clock,
        }
    }

    /// サンプルを記録し、判定結果を送信者に返す。異常なら参加中の全セッション Room に通知する
    pub async fn execute(
        &self,
        connection: &Connection,
        bpm: Bpm,
        exercise_id: Option<String>,
    ) -> HeartRateOutcome {
        let sample = HeartRateSample {
            user_id: connection.user.id.clone(),
            bpm,
            exercise_id,
            timestamp: Timestamp::new(self.clock.now_millis()),
        };
        let level = self.detector.evaluate(&sample);

        // 1. リングバッファに記録
        self.store_sample(&sample).await;

        // 2. 送信者に判定結果を返す
        let recorded = ServerEvent::HeartRateRecorded {
            sample: sample.clone(),
            level,
        };
        if let Err(e) = self.message_pusher.push_to(&connection.id, &recorded).await {
            tracing::warn!("Failed to reply to '{}': {}", connection.id, e);
        }

        // 3. 異常ならセッション Room に通知（送信者を含む）
        let mut alerted_rooms = Vec::new();
        if level.is_alert() {
            let mut rooms: Vec<RoomId> = self
                .room_directory
                .rooms_of(&connection.id)
                .await
                .into_iter()
                .filter(RoomId::is_session)
                .collect();
            rooms.sort();

            for room_id in rooms {
                let alert = ServerEvent::HeartRateAlert {
                    room_id: room_id.clone(),
                    user_name: connection.user.name.clone(),
                    level,
                    sample: sample.clone(),
                };
                self.room_directory.broadcast(&room_id, &alert, None).await;
                alerted_rooms.push(room_id);
            }
            tracing::info!(
                "Heart-rate {:?} for '{}' at {} bpm, alerted {} room(s)",
                level,
                connection.user.id,
                sample.bpm.value(),
                alerted_rooms.len()
            );
        }

        HeartRateOutcome {
            sample,
            level,
            alerted_rooms,
        }
    }

    async fn store_sample(&self, sample: &HeartRateSample) {
        let key = heart_rate_key(&sample.user_id);
        match serde_json::to_string(sample) {
            Ok(serialized) => {
                if let Err(e) = self.store.append(&key, serialized).await {
                    tracing::warn!("Heart-rate write to '{}' failed: {}", key, e);
                }
            }
            Err(e) => tracing::error!("Failed to serialize heart-rate sample: {}", e),
        }

        // 書き込みの成否に関わらず上限を保つ
        if let Err(e) = self.store.trim_to_last(&key, HEART_RATE_BUFFER_LEN).await {
            tracing::warn!("Heart-rate trim of '{}' failed: {}", key, e);
        }
    }
}
