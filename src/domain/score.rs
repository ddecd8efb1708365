//! Circle Score snapshot as read from the scoring contract.

use serde::Serialize;

/// Lowest possible score.
pub const SCORE_MIN: u32 = 300;
/// Highest possible score.
pub const SCORE_MAX: u32 = 850;
/// Score of a user with no recorded activity.
pub const SCORE_BASELINE: u32 = 500;

/// Points per counter, as applied by the scoring contract.
pub const POINTS_PER_SPLIT: i64 = 5;
pub const POINTS_PER_ON_TIME: i64 = 10;
pub const POINTS_PER_LATE: i64 = -50;
pub const POINTS_PER_LOAN_REPAID: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSnapshot {
    pub total_score: u32,
    pub bills_split: u64,
    pub loans_repaid: u64,
    pub late_payments: u64,
    pub on_time_payments: u64,
    pub last_activity_timestamp: i64,
}

impl ScoreSnapshot {
    /// Any non-zero counter, late payments included.
    pub fn has_activity(&self) -> bool {
        self.bills_split > 0
            || self.loans_repaid > 0
            || self.late_payments > 0
            || self.on_time_payments > 0
    }
}

pub fn clamp_score(raw: i64) -> u32 {
    raw.clamp(SCORE_MIN as i64, SCORE_MAX as i64) as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScoreTier {
    Excellent,
    Good,
    Fair,
    Building,
}

impl ScoreTier {
    pub fn for_score(score: u32) -> Self {
        match score {
            s if s >= 750 => ScoreTier::Excellent,
            s if s >= 650 => ScoreTier::Good,
            s if s >= 550 => ScoreTier::Fair,
            _ => ScoreTier::Building,
        }
    }
}
