use serde::Serialize;

use crate::domain::score::{
    clamp_score, POINTS_PER_LATE, POINTS_PER_LOAN_REPAID, POINTS_PER_ON_TIME, POINTS_PER_SPLIT,
    SCORE_BASELINE,
};
use crate::domain::ScoreSnapshot;

/// One point of the illustrative score trend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScorePoint {
    pub label: String,
    pub score: u32,
}

impl ScorePoint {
    fn new(label: impl Into<String>, score: u32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Synthesize a trend from aggregate counters.
///
/// The scoring contract keeps only counters, so this is not a replay of
/// history: counters are applied in a fixed order (splits, on-time, late,
/// loans) from the 500 baseline, clamping after every step.
pub fn project(snapshot: &ScoreSnapshot) -> Vec<ScorePoint> {
    if !snapshot.has_activity() {
        return vec![
            ScorePoint::new("Start", SCORE_BASELINE),
            ScorePoint::new("Now", SCORE_BASELINE),
        ];
    }

    let steps: [(u64, i64, &str); 4] = [
        (snapshot.bills_split, POINTS_PER_SPLIT, "splits"),
        (snapshot.on_time_payments, POINTS_PER_ON_TIME, "on-time"),
        (snapshot.late_payments, POINTS_PER_LATE, "late"),
        (snapshot.loans_repaid, POINTS_PER_LOAN_REPAID, "loans"),
    ];

    let mut points = vec![ScorePoint::new("Start", SCORE_BASELINE)];
    let mut current = SCORE_BASELINE;
    for (count, per_event, label) in steps {
        if count == 0 {
            continue;
        }
        let delta = (count.min(i64::MAX as u64) as i64).saturating_mul(per_event);
        current = clamp_score((current as i64).saturating_add(delta));
        points.push(ScorePoint::new(format!("{} {}", count, label), current));
    }
    points.push(ScorePoint::new(
        "Now",
        clamp_score(snapshot.total_score as i64),
    ));
    points
}
