//! ヒューリスティックなフォーム採点
//!
//! 実運用では外部の採点サービスに置き換わる。ここではクライアントが送ってくる
//! 0.0〜1.0 の指標（`depth`, `alignment`, `tempo`, `stability`）の平均をスコアにする。

use std::sync::Arc;

use async_trait::async_trait;
use coachlive_shared::time::Clock;

use crate::domain::{FormAnalysisResult, FormScorer, ScoringError, Timestamp};

const METRICS: [(&str, &str); 4] = [
    ("depth", "Increase your range of motion to reach full depth"),
    ("alignment", "Keep your joints stacked and aligned through the movement"),
    ("tempo", "Slow down and control the lowering phase"),
    ("stability", "Brace your core to reduce sway"),
];

/// この値を下回った指標には改善提案を付ける
const SUGGESTION_THRESHOLD: f64 = 0.7;

pub struct HeuristicFormScorer {
    clock: Arc<dyn Clock>,
}

impl HeuristicFormScorer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

fn feedback_for(score: u8) -> &'static str {
    match score {
        85.. => "Excellent form, keep it up",
        70..=84 => "Good form with some room for improvement",
        _ => "Form needs attention, consider lowering the load",
    }
}

#[async_trait]
impl FormScorer for HeuristicFormScorer {
    async fn score(
        &self,
        exercise_id: &str,
        form_payload: &serde_json::Value,
    ) -> Result<FormAnalysisResult, ScoringError> {
        let object = form_payload
            .as_object()
            .ok_or_else(|| ScoringError::InvalidPayload("payload must be an object".to_string()))?;

        let measured: Vec<(f64, &str)> = METRICS
            .iter()
            .filter_map(|(name, suggestion)| {
                object
                    .get(*name)
                    .and_then(serde_json::Value::as_f64)
                    .map(|value| (value.clamp(0.0, 1.0), *suggestion))
            })
            .collect();
        if measured.is_empty() {
            return Err(ScoringError::InvalidPayload(
                "no known form metrics in payload".to_string(),
            ));
        }

        let average = measured.iter().map(|(value, _)| value).sum::<f64>() / measured.len() as f64;
        let score = (average * 100.0).round() as u8;
        let suggestions = measured
            .iter()
            .filter(|(value, _)| *value < SUGGESTION_THRESHOLD)
            .map(|(_, suggestion)| suggestion.to_string())
            .collect();

        FormAnalysisResult::new(
            exercise_id.to_string(),
            score,
            feedback_for(score).to_string(),
            suggestions,
            Timestamp::new(self.clock.now_millis()),
        )
        .map_err(|e| ScoringError::InvalidPayload(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coachlive_shared::time::FixedClock;
    use serde_json::json;

    fn scorer() -> HeuristicFormScorer {
        HeuristicFormScorer::new(Arc::new(FixedClock::new(42)))
    }

    #[tokio::test]
    async fn test_score_averages_metrics() {
        // テスト項目: 指標の平均がスコアになり、低い指標に改善提案が付く
        // given (前提条件):
        let payload = json!({"depth": 0.6, "alignment": 1.0, "tempo": 0.8});

        // when (操作):
        let result = scorer().score("squat", &payload).await.unwrap();

        // then (期待する結果):
        assert_eq!(result.score(), 80);
        assert_eq!(result.exercise_id, "squat");
        assert_eq!(result.suggestions.len(), 1);
        assert!(result.suggestions[0].contains("depth"));
        assert_eq!(result.timestamp, Timestamp::new(42));
    }

    #[tokio::test]
    async fn test_score_clamps_out_of_range_values() {
        // テスト項目: 範囲外の値は 0.0〜1.0 に丸められる
        // when (操作):
        let result = scorer()
            .score("plank", &json!({"stability": 7.5}))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(result.score(), 100);
        assert!(result.suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_score_rejects_unscorable_payloads() {
        // テスト項目: 指標を含まないペイロードは採点できない
        // then (期待する結果):
        assert!(matches!(
            scorer().score("squat", &json!("video-frame")).await,
            Err(ScoringError::InvalidPayload(_))
        ));
        assert!(matches!(
            scorer().score("squat", &json!({"unknown": 1.0})).await,
            Err(ScoringError::InvalidPayload(_))
        ));
    }
}
