//! In-memory ledger and score contracts for tests and offline runs.

use super::{DataSourceError, DebtReadResult, LedgerSource, LedgerWriter, ScoreSource};
use crate::domain::{
    Address, DebtId, DebtRecord, Decimal, ScoreSnapshot, TimeSecs, TxHash, U256,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

#[derive(Debug, Default)]
struct MockState {
    debts: Vec<DebtRecord>,
    next_id: U256,
}

/// Mock contracts that behave like the deployed ones.
///
/// Writes land in the same record set reads come from, so a confirmed
/// `add_debt` is visible on the next refresh.
#[derive(Debug, Clone, Default)]
pub struct MockLedgerSource {
    state: Arc<Mutex<MockState>>,
    failing_reads: HashSet<DebtId>,
    fail_id_listing: bool,
    scores: HashMap<Address, ScoreSnapshot>,
    borrowing_power: HashMap<Address, Decimal>,
    /// Zero-based write index that reverts, if any.
    revert_write_at: Option<usize>,
    writes_attempted: Arc<AtomicUsize>,
}

impl MockLedgerSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record. Only effective before the mock is cloned.
    pub fn with_debt(mut self, debt: DebtRecord) -> Self {
        match Arc::get_mut(&mut self.state) {
            Some(state) => {
                let state = state.get_mut();
                state.next_id = state.next_id.max(debt.id.as_uint() + U256::from(1u8));
                state.debts.push(debt);
            }
            None => warn!("Mock already shared, ignoring seeded debt {}", debt.id),
        }
        self
    }

    pub fn with_debts(self, debts: Vec<DebtRecord>) -> Self {
        debts.into_iter().fold(self, |mock, d| mock.with_debt(d))
    }

    /// Make `getDebt` fail for this id while the rest of the batch succeeds.
    pub fn with_failing_read(mut self, id: DebtId) -> Self {
        self.failing_reads.insert(id);
        self
    }

    pub fn with_failing_id_listing(mut self) -> Self {
        self.fail_id_listing = true;
        self
    }

    pub fn with_score(mut self, user: &Address, snapshot: ScoreSnapshot) -> Self {
        self.scores.insert(user.clone(), snapshot);
        self
    }

    pub fn with_borrowing_power(mut self, user: &Address, amount: Decimal) -> Self {
        self.borrowing_power.insert(user.clone(), amount);
        self
    }

    pub fn with_revert_at_write(mut self, index: usize) -> Self {
        self.revert_write_at = Some(index);
        self
    }

    pub fn writes_attempted(&self) -> usize {
        self.writes_attempted.load(Ordering::SeqCst)
    }

    pub async fn debts(&self) -> Vec<DebtRecord> {
        self.state.lock().await.debts.clone()
    }

    fn next_write(&self) -> Result<TxHash, DataSourceError> {
        let index = self.writes_attempted.fetch_add(1, Ordering::SeqCst);
        let hash = TxHash::new(format!("0x{:064x}", index + 1));
        if self.revert_write_at == Some(index) {
            return Err(DataSourceError::Reverted(hash));
        }
        Ok(hash)
    }
}

#[async_trait]
impl LedgerSource for MockLedgerSource {
    async fn fetch_debt_ids(&self, owner: &Address) -> Result<Vec<DebtId>, DataSourceError> {
        if self.fail_id_listing {
            return Err(DataSourceError::NetworkError("mock listing failure".to_string()));
        }
        let state = self.state.lock().await;
        Ok(state
            .debts
            .iter()
            .filter(|d| d.involves(owner))
            .map(|d| d.id)
            .collect())
    }

    async fn fetch_debts(&self, ids: &[DebtId]) -> Result<Vec<DebtReadResult>, DataSourceError> {
        let state = self.state.lock().await;
        Ok(ids
            .iter()
            .map(|id| {
                let result = if self.failing_reads.contains(id) {
                    Err(DataSourceError::RpcError {
                        code: -32000,
                        message: "mock read failure".to_string(),
                    })
                } else {
                    state
                        .debts
                        .iter()
                        .find(|d| d.id == *id)
                        .cloned()
                        .ok_or_else(|| DataSourceError::Other(format!("unknown debt {}", id)))
                };
                (*id, result)
            })
            .collect())
    }
}

#[async_trait]
impl LedgerWriter for MockLedgerSource {
    async fn add_debt(
        &self,
        _from: &Address,
        creditor: &Address,
        debtor: &Address,
        amount: Decimal,
    ) -> Result<TxHash, DataSourceError> {
        let wei = amount
            .to_wei()
            .map_err(|e| DataSourceError::Other(e.to_string()))?;
        if creditor == debtor {
            return Err(DataSourceError::RpcError {
                code: 3,
                message: "execution reverted: creditor equals debtor".to_string(),
            });
        }
        let hash = self.next_write()?;

        let mut state = self.state.lock().await;
        let id = DebtId::from_uint(state.next_id);
        state.next_id += U256::from(1u8);
        state.debts.push(DebtRecord::new(
            id,
            creditor.clone(),
            debtor.clone(),
            wei,
            TimeSecs::now(),
            false,
        ));
        Ok(hash)
    }

    async fn settle_debt(&self, from: &Address, id: DebtId) -> Result<TxHash, DataSourceError> {
        let mut state = self.state.lock().await;
        let debt = state
            .debts
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| DataSourceError::RpcError {
                code: 3,
                message: format!("execution reverted: unknown debt {}", id),
            })?;
        if debt.settled || debt.debtor != *from {
            return Err(DataSourceError::RpcError {
                code: 3,
                message: "execution reverted: not settleable".to_string(),
            });
        }
        let hash = self.next_write()?;
        debt.settled = true;
        Ok(hash)
    }
}

#[async_trait]
impl ScoreSource for MockLedgerSource {
    async fn fetch_score(&self, user: &Address) -> Result<u32, DataSourceError> {
        self.fetch_score_details(user).await.map(|s| s.total_score)
    }

    async fn fetch_score_details(&self, user: &Address) -> Result<ScoreSnapshot, DataSourceError> {
        self.scores
            .get(user)
            .copied()
            .ok_or_else(|| DataSourceError::Other(format!("no score for {}", user)))
    }

    async fn fetch_borrowing_power(&self, user: &Address) -> Result<Decimal, DataSourceError> {
        Ok(self
            .borrowing_power
            .get(user)
            .copied()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const B: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    fn debt(id: u64) -> DebtRecord {
        DebtRecord::new(
            DebtId::new(id),
            addr(A),
            addr(B),
            U256::from(1_000_000_000_000_000_000u128),
            TimeSecs::new(1_000),
            false,
        )
    }

    #[tokio::test]
    async fn test_mock_lists_ids_for_either_party() {
        let mock = MockLedgerSource::new().with_debt(debt(1)).with_debt(debt(2));
        assert_eq!(mock.fetch_debt_ids(&addr(A)).await.unwrap().len(), 2);
        assert_eq!(mock.fetch_debt_ids(&addr(B)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_partial_read_failure() {
        let mock = MockLedgerSource::new()
            .with_debts(vec![debt(1), debt(2)])
            .with_failing_read(DebtId::new(2));
        let results = mock
            .fetch_debts(&[DebtId::new(1), DebtId::new(2)])
            .await
            .unwrap();
        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_err());
    }

    #[tokio::test]
    async fn test_mock_write_then_read() {
        let mock = MockLedgerSource::new().with_debt(debt(4));
        let amount = Decimal::from_str_canonical("12.50").unwrap();
        mock.add_debt(&addr(B), &addr(A), &addr(B), amount)
            .await
            .unwrap();
        let debts = mock.debts().await;
        assert_eq!(debts.len(), 2);
        assert_eq!(debts[1].id, DebtId::new(5));
        assert_eq!(debts[1].amount_wei, U256::from(12_500_000_000_000_000_000u128));
    }

    #[tokio::test]
    async fn test_mock_settle_only_by_debtor_once() {
        let mock = MockLedgerSource::new().with_debt(debt(1));
        assert!(mock.settle_debt(&addr(A), DebtId::new(1)).await.is_err());
        assert!(mock.settle_debt(&addr(B), DebtId::new(1)).await.is_ok());
        assert!(mock.settle_debt(&addr(B), DebtId::new(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_mock_revert_at_write() {
        let mock = MockLedgerSource::new().with_revert_at_write(1);
        let amount = Decimal::from_str_canonical("1").unwrap();
        assert!(mock.add_debt(&addr(A), &addr(A), &addr(B), amount).await.is_ok());
        assert!(matches!(
            mock.add_debt(&addr(A), &addr(A), &addr(B), amount).await,
            Err(DataSourceError::Reverted(_))
        ));
        assert_eq!(mock.writes_attempted(), 2);
    }
}
