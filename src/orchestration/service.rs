use crate::datasource::{DataSourceError, LedgerSource, ScoreSource};
use crate::domain::score::SCORE_BASELINE;
use crate::domain::{
    Address, BalanceSummary, DebtId, Decimal, DirectedDebt, ScoreSnapshot, ScoreTier, TimeSecs,
    TimelineEvent,
};
use crate::engine::{
    aggregate, normalize_all, project, ScorePoint, SettlementClock, TimelineBuilder,
};
use crate::orchestration::reader::LedgerReader;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything derived from one ledger read for one user.
#[derive(Debug, Clone)]
pub struct LedgerView {
    pub user: Address,
    pub debts: Vec<DirectedDebt>,
    pub balance: BalanceSummary,
    /// Newest first.
    pub timeline: Vec<TimelineEvent>,
    pub failed_ids: Vec<DebtId>,
    pub refreshed_at: TimeSecs,
}

#[derive(Debug, Clone)]
pub struct ScoreView {
    pub score: u32,
    pub tier: ScoreTier,
    /// `None` when the details read failed.
    pub details: Option<ScoreSnapshot>,
    pub borrowing_power: Decimal,
    pub projection: Vec<ScorePoint>,
}

#[derive(Debug, Clone)]
pub struct LedgerService {
    reader: LedgerReader,
    scores: Arc<dyn ScoreSource>,
    timeline: TimelineBuilder,
}

impl LedgerService {
    pub fn new(
        ledger: Arc<dyn LedgerSource>,
        scores: Arc<dyn ScoreSource>,
        clock: SettlementClock,
    ) -> Self {
        Self {
            reader: LedgerReader::new(ledger),
            scores,
            timeline: TimelineBuilder::new(clock),
        }
    }

    /// One full refresh: read, normalize, then aggregate and build the
    /// timeline from the same normalized set.
    pub async fn refresh(&self, user: &Address) -> Result<LedgerView, DataSourceError> {
        let read = self.reader.read(user).await?;
        let debts = normalize_all(&read.records, user);
        let balance = aggregate(&debts);
        let timeline = self.timeline.build(&debts);

        info!(
            "Refreshed {}: {} debts, net {}",
            user,
            debts.len(),
            balance.net
        );

        Ok(LedgerView {
            user: user.clone(),
            debts,
            balance,
            timeline,
            failed_ids: read.failed_ids,
            refreshed_at: TimeSecs::now(),
        })
    }

    /// The other party to debt `id`, as seen from `user`.
    pub async fn counterparty(
        &self,
        user: &Address,
        id: DebtId,
    ) -> Result<Address, DataSourceError> {
        let record = self.reader.read_one(id).await?;
        Ok(if record.creditor == *user {
            record.debtor
        } else {
            record.creditor
        })
    }

    /// Score, details and borrowing power, read concurrently.
    ///
    /// Never fails: the score falls back to the 500 baseline and
    /// borrowing power to zero.
    pub async fn score(&self, user: &Address) -> ScoreView {
        let (score, details, power) = futures::join!(
            self.scores.fetch_score(user),
            self.scores.fetch_score_details(user),
            self.scores.fetch_borrowing_power(user),
        );

        let score = score.unwrap_or_else(|e| {
            warn!("Score read failed for {}: {}", user, e);
            SCORE_BASELINE
        });
        let details = details
            .map_err(|e| warn!("Score details read failed for {}: {}", user, e))
            .ok();
        let borrowing_power = power.unwrap_or_else(|e| {
            warn!("Borrowing power read failed for {}: {}", user, e);
            Decimal::zero()
        });
        let projection = project(&details.unwrap_or_default());

        ScoreView {
            score,
            tier: ScoreTier::for_score(score),
            details,
            borrowing_power,
            projection,
        }
    }
}
