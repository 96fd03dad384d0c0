//! UseCase: フォーム分析
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - 分析結果の返信と、セッション Room への共有
//!
//! ### なぜこのテストが必要か
//! - 詳細な結果（フィードバック・提案）は本人だけに返し、他メンバーにはスコアだけを共有する
//! - 分析に失敗した場合は何も共有しない
//!
//! ### どのような状況を想定しているか
//! - 正常系：セッション参加中の分析
//! - 異常系：スコアラーの失敗

use std::sync::Arc;

use crate::domain::{
    Connection, FormAnalysisResult, FormScorer, MessagePusher, RoomDirectory, RoomId,
    ScoringError, ServerEvent,
};

/// フォーム分析のユースケース
pub struct AnalyzeFormUseCase {
    room_directory: Arc<dyn RoomDirectory>,
    message_pusher: Arc<dyn MessagePusher>,
    scorer: Arc<dyn FormScorer>,
}

impl AnalyzeFormUseCase {
    pub fn new(
        room_directory: Arc<dyn RoomDirectory>,
        message_pusher: Arc<dyn MessagePusher>,
        scorer: Arc<dyn FormScorer>,
    ) -> Self {
        Self {
            room_directory,
            message_pusher,
            scorer,
        }
    }

    /// フォームを採点し、結果を送信者に返す。参加中のセッション Room には要約を共有する（送信者を除く）
    pub async fn execute(
        &self,
        connection: &Connection,
        exercise_id: &str,
        form_payload: &serde_json::Value,
    ) -> Result<FormAnalysisResult, ScoringError> {
        let result = self.scorer.score(exercise_id, form_payload).await?;

        let reply = ServerEvent::FormAnalysisResult(result.clone());
        if let Err(e) = self.message_pusher.push_to(&connection.id, &reply).await {
            tracing::warn!("Failed to reply to '{}': {}", connection.id, e);
        }

        let mut rooms: Vec<RoomId> = self
            .room_directory
            .rooms_of(&connection.id)
            .await
            .into_iter()
            .filter(RoomId::is_session)
            .collect();
        rooms.sort();
        for room_id in rooms {
            let shared = ServerEvent::FormAnalysisShared {
                room_id: room_id.clone(),
                user: connection.user.clone(),
                exercise_id: result.exercise_id.clone(),
                score: result.score(),
                timestamp: result.timestamp,
            };
            self.room_directory
                .broadcast(&room_id, &shared, Some(&connection.id))
                .await;
        }

        tracing::debug!(
            "Form analysis for '{}' on '{}' scored {}",
            connection.user.id,
            exercise_id,
            result.score()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Timestamp, collaborator::MockFormScorer},
        infrastructure::dto::websocket::OutboundMessage,
        usecase::test_support::{Fixture, NOW, drain},
    };

    fn scored(score: u8) -> FormAnalysisResult {
        FormAnalysisResult::new(
            "squat".to_string(),
            score,
            "Solid form".to_string(),
            vec!["Keep your chest up".to_string()],
            Timestamp::new(NOW),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_analyze_form_replies_and_shares_summary() {
        // テスト項目: 本人には詳細な結果が、他のメンバーにはスコアの要約が届く
        // given (前提条件):
        let fixture = Fixture::new();
        let mut scorer = MockFormScorer::new();
        scorer
            .expect_score()
            .withf(|exercise_id, _| exercise_id == "squat")
            .returning(|_, _| Ok(scored(82)));
        let (a, mut rx_a) = fixture.connect("a").await;
        let (coach, mut rx_coach) = fixture.connect("coach").await;
        fixture.join_session(&a, "7").await;
        fixture.join_session(&coach, "7").await;
        let uc = AnalyzeFormUseCase::new(
            fixture.directory.clone(),
            fixture.pusher.clone(),
            Arc::new(scorer),
        );

        // when (操作):
        let result = uc
            .execute(&a, "squat", &serde_json::json!({"depth": 0.8}))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(result.score(), 82);
        assert!(matches!(
            &drain(&mut rx_a)[..],
            [OutboundMessage::FormAnalysisResult(dto)] if dto.score == 82 && dto.suggestions.len() == 1
        ));
        assert!(matches!(
            &drain(&mut rx_coach)[..],
            [OutboundMessage::FormAnalysisShared { user, score, .. }] if user.user_id == "a" && *score == 82
        ));
    }

    #[tokio::test]
    async fn test_analyze_form_failure_forwards_nothing() {
        // テスト項目: 採点に失敗すると誰にも何も届かない
        // given (前提条件):
        let fixture = Fixture::new();
        let mut scorer = MockFormScorer::new();
        scorer
            .expect_score()
            .returning(|_, _| Err(ScoringError::InvalidPayload("empty".to_string())));
        let (a, mut rx_a) = fixture.connect("a").await;
        let (coach, mut rx_coach) = fixture.connect("coach").await;
        fixture.join_session(&a, "7").await;
        fixture.join_session(&coach, "7").await;
        let uc = AnalyzeFormUseCase::new(
            fixture.directory.clone(),
            fixture.pusher.clone(),
            Arc::new(scorer),
        );

        // when (操作):
        let result = uc.execute(&a, "squat", &serde_json::json!({})).await;

        // then (期待する結果):
        assert!(matches!(result, Err(ScoringError::InvalidPayload(_))));
        assert!(drain(&mut rx_a).is_empty());
        assert!(drain(&mut rx_coach).is_empty());
    }
}
