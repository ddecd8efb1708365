//! Total orderings for timeline events.

use std::cmp::Ordering;

use crate::domain::{DebtId, Decimal, SortOrder, TimelineEvent};

/// Stable ordering key for timeline events.
///
/// Events are unique per (debt id, kind), so with both present every
/// order below is total.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct EventOrderingKey {
    pub primary: (i128, i128),
    pub debt_id: DebtId,
    pub kind_rank: u8,
}

fn amount_key(amount: Decimal) -> i128 {
    // Mantissa at a fixed scale so amounts compare as integers.
    let mut inner = amount.inner();
    inner.rescale(18);
    inner.mantissa()
}

impl EventOrderingKey {
    pub fn for_event(event: &TimelineEvent, sort: SortOrder) -> Self {
        let ts = event.timestamp.as_i64() as i128;
        let amount = amount_key(event.amount);
        let primary = match sort {
            SortOrder::Newest => (-ts, -amount),
            SortOrder::Oldest => (ts, amount),
            SortOrder::Highest => (-amount, -ts),
            SortOrder::Lowest => (amount, ts),
        };
        EventOrderingKey {
            primary,
            debt_id: event.debt_id,
            kind_rank: event.kind.rank(),
        }
    }
}

pub fn compare_events(a: &TimelineEvent, b: &TimelineEvent, sort: SortOrder) -> Ordering {
    EventOrderingKey::for_event(a, sort).cmp(&EventOrderingKey::for_event(b, sort))
}

/// Sort events deterministically for the given order.
pub fn sort_events(events: &mut [TimelineEvent], sort: SortOrder) {
    events.sort_by_cached_key(|e| EventOrderingKey::for_event(e, sort));
}
