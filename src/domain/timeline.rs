//! Activity feed events and the query options applied to them.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{Address, DebtId, Decimal, TimeSecs};

/// Score points awarded for every bill split.
pub const BILL_SPLIT_POINTS: i32 = 5;
/// Score points for a payment settled within the on-time window.
pub const ON_TIME_PAYMENT_POINTS: i32 = 10;
/// Score points for a late payment.
pub const LATE_PAYMENT_POINTS: i32 = -50;
/// Maximum seconds between creation and settlement for an on-time payment.
pub const ON_TIME_WINDOW_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    BillSplit,
    Payment,
    Received,
}

impl EventKind {
    /// Final tie-break between events of the same record.
    pub fn rank(&self) -> u8 {
        match self {
            EventKind::BillSplit => 0,
            EventKind::Payment => 1,
            EventKind::Received => 2,
        }
    }

    pub fn id_suffix(&self) -> &'static str {
        match self {
            EventKind::BillSplit => "split",
            EventKind::Payment => "payment",
            EventKind::Received => "received",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    /// `{debtId}-{split|payment|received}`.
    pub id: String,
    pub debt_id: DebtId,
    pub kind: EventKind,
    pub amount: Decimal,
    pub timestamp: TimeSecs,
    pub other_party: Address,
    pub score_impact: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_time: Option<bool>,
    /// Whether the record was settled when the feed was built.
    pub settled: bool,
    /// Set when `timestamp` (and `on_time`) come from the offset
    /// approximation rather than a real settlement time.
    pub settlement_approximated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindFilter {
    #[default]
    All,
    BillSplit,
    Payment,
    Received,
}

impl KindFilter {
    pub fn accepts(&self, kind: EventKind) -> bool {
        match self {
            KindFilter::All => true,
            KindFilter::BillSplit => kind == EventKind::BillSplit,
            KindFilter::Payment => kind == EventKind::Payment,
            KindFilter::Received => kind == EventKind::Received,
        }
    }
}

impl FromStr for KindFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(KindFilter::All),
            "bill_split" => Ok(KindFilter::BillSplit),
            "payment" => Ok(KindFilter::Payment),
            "received" => Ok(KindFilter::Received),
            other => Err(format!(
                "must be all, bill_split, payment, or received, got {}",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Highest,
    Lowest,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            "highest" => Ok(SortOrder::Highest),
            "lowest" => Ok(SortOrder::Lowest),
            other => Err(format!(
                "must be newest, oldest, highest, or lowest, got {}",
                other
            )),
        }
    }
}

/// Client-side view selection over a built timeline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimelineQuery {
    pub filter: KindFilter,
    pub search: String,
    pub sort: SortOrder,
}
