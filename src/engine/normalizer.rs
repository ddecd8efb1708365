use tracing::warn;

use crate::domain::{Address, DebtRecord, Decimal, DirectedDebt};

/// Orient a ledger record from the user's side.
///
/// Returns `None` when the user is neither party, when the record names
/// the same account on both sides, or when the amount does not convert.
pub fn normalize(record: &DebtRecord, user: &Address) -> Option<DirectedDebt> {
    let is_creditor = record.creditor == *user;
    let is_debtor = record.debtor == *user;

    if is_creditor && is_debtor {
        warn!("Debt {} names {} as both parties, skipping", record.id, user);
        return None;
    }
    if !is_creditor && !is_debtor {
        return None;
    }

    let amount = match Decimal::from_wei(record.amount_wei) {
        Ok(a) => a,
        Err(e) => {
            warn!("Debt {} amount not convertible: {}", record.id, e);
            return None;
        }
    };

    let counterparty = if is_debtor {
        record.creditor.clone()
    } else {
        record.debtor.clone()
    };

    Some(DirectedDebt {
        record: record.clone(),
        is_user_debtor: is_debtor,
        counterparty,
        amount,
    })
}

/// Normalize a batch, dropping records that do not apply to the user.
pub fn normalize_all(records: &[DebtRecord], user: &Address) -> Vec<DirectedDebt> {
    records.iter().filter_map(|r| normalize(r, user)).collect()
}
