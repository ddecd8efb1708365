//! Debt records as read from the ledger contract, and views derived from them.

use serde::{Deserialize, Serialize};

use super::{Address, DebtId, Decimal, TimeSecs, U256};

/// One record from the ledger contract.
///
/// Immutable once read; a refresh replaces the whole set. `settled` only
/// ever moves from false to true on the ledger side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtRecord {
    pub id: DebtId,
    pub creditor: Address,
    pub debtor: Address,
    /// Raw 18-decimal fixed-point amount.
    pub amount_wei: U256,
    pub created_at: TimeSecs,
    pub settled: bool,
    /// True settlement time. The ledger's `getDebt` does not return it, so
    /// records read from chain carry `None`.
    pub settled_at: Option<TimeSecs>,
}

impl DebtRecord {
    pub fn new(
        id: DebtId,
        creditor: Address,
        debtor: Address,
        amount_wei: U256,
        created_at: TimeSecs,
        settled: bool,
    ) -> Self {
        Self {
            id,
            creditor,
            debtor,
            amount_wei,
            created_at,
            settled,
            settled_at: None,
        }
    }

    pub fn with_settled_at(mut self, settled_at: TimeSecs) -> Self {
        self.settled = true;
        self.settled_at = Some(settled_at);
        self
    }

    pub fn involves(&self, user: &Address) -> bool {
        self.creditor == *user || self.debtor == *user
    }
}

/// A record seen from the current user's side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectedDebt {
    pub record: DebtRecord,
    pub is_user_debtor: bool,
    pub counterparty: Address,
    /// Face value after conversion from `record.amount_wei`.
    pub amount: Decimal,
}

impl DirectedDebt {
    pub fn id(&self) -> DebtId {
        self.record.id
    }

    pub fn is_settled(&self) -> bool {
        self.record.settled
    }
}

/// Totals over unsettled debts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BalanceSummary {
    /// Owed to the user.
    pub owed: Decimal,
    /// Owed by the user.
    pub owing: Decimal,
    pub net: Decimal,
}
