//! Activity feed built from directed debts.

use crate::domain::ordering::sort_events;
use crate::domain::timeline::{
    BILL_SPLIT_POINTS, LATE_PAYMENT_POINTS, ON_TIME_PAYMENT_POINTS, ON_TIME_WINDOW_SECS,
};
use crate::domain::{DirectedDebt, EventKind, TimeSecs, TimelineEvent, TimelineQuery};

/// How settlement times are obtained when the ledger does not report them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementClock {
    /// Seconds added to `created_at` when a settled record has no
    /// `settled_at`.
    pub fallback_offset_secs: i64,
}

impl Default for SettlementClock {
    fn default() -> Self {
        Self {
            fallback_offset_secs: 60 * 60,
        }
    }
}

impl SettlementClock {
    pub fn new(fallback_offset_secs: i64) -> Self {
        Self {
            fallback_offset_secs,
        }
    }

    /// Settlement time and whether it was approximated.
    pub fn settled_at(&self, debt: &DirectedDebt) -> (TimeSecs, bool) {
        match debt.record.settled_at {
            Some(at) => (at, false),
            None => (
                debt.record
                    .created_at
                    .saturating_add(self.fallback_offset_secs),
                true,
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TimelineBuilder {
    clock: SettlementClock,
}

impl TimelineBuilder {
    pub fn new(clock: SettlementClock) -> Self {
        Self { clock }
    }

    /// Expand every debt into its events, in canonical (newest) order.
    pub fn build(&self, debts: &[DirectedDebt]) -> Vec<TimelineEvent> {
        let mut events = Vec::with_capacity(debts.len() * 2);
        for debt in debts {
            events.push(self.bill_split_event(debt));
            if debt.is_settled() {
                events.push(self.settlement_event(debt));
            }
        }
        sort_events(&mut events, Default::default());
        events
    }

    fn bill_split_event(&self, debt: &DirectedDebt) -> TimelineEvent {
        TimelineEvent {
            id: event_id(debt, EventKind::BillSplit),
            debt_id: debt.id(),
            kind: EventKind::BillSplit,
            amount: debt.amount,
            timestamp: debt.record.created_at,
            other_party: debt.counterparty.clone(),
            score_impact: BILL_SPLIT_POINTS,
            on_time: None,
            settled: debt.is_settled(),
            settlement_approximated: false,
        }
    }

    fn settlement_event(&self, debt: &DirectedDebt) -> TimelineEvent {
        let (settled_at, approximated) = self.clock.settled_at(debt);

        let (kind, score_impact, on_time) = if debt.is_user_debtor {
            let on_time = settled_at.saturating_sub(debt.record.created_at) <= ON_TIME_WINDOW_SECS;
            let impact = if on_time {
                ON_TIME_PAYMENT_POINTS
            } else {
                LATE_PAYMENT_POINTS
            };
            (EventKind::Payment, impact, Some(on_time))
        } else {
            (EventKind::Received, 0, None)
        };

        TimelineEvent {
            id: event_id(debt, kind),
            debt_id: debt.id(),
            kind,
            amount: debt.amount,
            timestamp: settled_at,
            other_party: debt.counterparty.clone(),
            score_impact,
            on_time,
            settled: true,
            settlement_approximated: approximated,
        }
    }
}

fn event_id(debt: &DirectedDebt, kind: EventKind) -> String {
    format!("{}-{}", debt.id(), kind.id_suffix())
}

/// Apply a filter/search/sort selection to a built feed.
///
/// Always works from the full feed, never from a previous selection.
pub fn select(events: &[TimelineEvent], query: &TimelineQuery) -> Vec<TimelineEvent> {
    let needle = query.search.trim().to_lowercase();
    let mut selected: Vec<TimelineEvent> = events
        .iter()
        .filter(|e| query.filter.accepts(e.kind))
        .filter(|e| needle.is_empty() || matches_search(e, &needle))
        .cloned()
        .collect();
    sort_events(&mut selected, query.sort);
    selected
}

fn matches_search(event: &TimelineEvent, needle: &str) -> bool {
    event.other_party.to_string().contains(needle)
        || event.amount.to_canonical_string().contains(needle)
        || event.id.contains(needle)
}
