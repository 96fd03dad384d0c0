//! 心拍の異常検知
//!
//! 1 サンプルだけを見る純粋関数。履歴による平滑化は行わない。

use serde::{Deserialize, Serialize};

use super::{entity::HeartRateSample, value_object::Bpm};

/// 異常レベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    None,
    Warning,
    Critical,
}

impl AlertLevel {
    pub fn is_alert(&self) -> bool {
        *self != AlertLevel::None
    }
}

/// 心拍の閾値
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnomalyDetector {
    /// これを超えると Critical
    pub critical_above: u16,
    /// これを超えると Warning
    pub warning_above: u16,
    /// これを下回ると Warning
    pub warning_below: u16,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self {
            critical_above: 190,
            warning_above: 180,
            warning_below: 50,
        }
    }
}

impl AnomalyDetector {
    pub fn evaluate(&self, sample: &HeartRateSample) -> AlertLevel {
        self.evaluate_bpm(sample.bpm)
    }

    pub fn evaluate_bpm(&self, bpm: Bpm) -> AlertLevel {
        let bpm = bpm.value();
        if bpm > self.critical_above {
            AlertLevel::Critical
        } else if bpm > self.warning_above || bpm < self.warning_below {
            AlertLevel::Warning
        } else {
            AlertLevel::None
        }
    }
}
