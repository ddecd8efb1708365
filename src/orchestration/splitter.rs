use crate::datasource::{DataSourceError, LedgerWriter};
use crate::domain::{Address, DebtId, Decimal, TxHash};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

/// One participant's part of a split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitShare {
    pub debtor: Address,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SplitProgress {
    pub completed: usize,
    pub total: usize,
}

/// The write that halted a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitFailure {
    pub index: usize,
    pub debtor: Address,
    pub error: DataSourceError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOutcome {
    /// Hashes of confirmed writes, in submission order.
    pub confirmed: Vec<TxHash>,
    pub total: usize,
    pub failure: Option<SplitFailure>,
}

impl SplitOutcome {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none() && self.confirmed.len() == self.total
    }
}

/// Rejected before anything was written.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SplitError {
    #[error("a split needs at least one share")]
    Empty,
    #[error("share for {0} is not a positive amount")]
    NonPositive(Address),
    #[error("share for {0} cannot be written on-chain: {1}")]
    Unrepresentable(Address, String),
    #[error("creditor {0} cannot owe themselves")]
    SelfDebt(Address),
}

/// Issues ledger writes one at a time, each confirmed before the next.
#[derive(Debug, Clone)]
pub struct SplitExecutor {
    writer: Arc<dyn LedgerWriter>,
}

impl SplitExecutor {
    pub fn new(writer: Arc<dyn LedgerWriter>) -> Self {
        Self { writer }
    }

    pub async fn execute(
        &self,
        creditor: &Address,
        shares: &[SplitShare],
    ) -> Result<SplitOutcome, SplitError> {
        let (progress, _rx) = watch::channel(SplitProgress::default());
        self.execute_with_progress(creditor, shares, &progress).await
    }

    /// Record one debt per share, owed to `creditor`.
    ///
    /// The whole batch is validated first. A failed write stops the batch;
    /// earlier confirmed writes stay on the ledger.
    pub async fn execute_with_progress(
        &self,
        creditor: &Address,
        shares: &[SplitShare],
        progress: &watch::Sender<SplitProgress>,
    ) -> Result<SplitOutcome, SplitError> {
        validate(creditor, shares)?;

        let total = shares.len();
        progress.send_replace(SplitProgress {
            completed: 0,
            total,
        });

        let mut confirmed = Vec::with_capacity(total);
        for (index, share) in shares.iter().enumerate() {
            match self
                .writer
                .add_debt(creditor, creditor, &share.debtor, share.amount)
                .await
            {
                Ok(hash) => {
                    info!(
                        "Split {}/{}: {} owes {} {} ({})",
                        index + 1,
                        total,
                        share.debtor,
                        creditor,
                        share.amount,
                        hash
                    );
                    confirmed.push(hash);
                    progress.send_replace(SplitProgress {
                        completed: confirmed.len(),
                        total,
                    });
                }
                Err(error) => {
                    warn!(
                        "Split halted at {}/{} for {}: {}",
                        index + 1,
                        total,
                        share.debtor,
                        error
                    );
                    return Ok(SplitOutcome {
                        confirmed,
                        total,
                        failure: Some(SplitFailure {
                            index,
                            debtor: share.debtor.clone(),
                            error,
                        }),
                    });
                }
            }
        }

        Ok(SplitOutcome {
            confirmed,
            total,
            failure: None,
        })
    }

    /// Settle one debt as `debtor`.
    pub async fn settle(&self, debtor: &Address, id: DebtId) -> Result<TxHash, DataSourceError> {
        let hash = self.writer.settle_debt(debtor, id).await?;
        info!("Debt {} settled by {} ({})", id, debtor, hash);
        Ok(hash)
    }
}

fn validate(creditor: &Address, shares: &[SplitShare]) -> Result<(), SplitError> {
    if shares.is_empty() {
        return Err(SplitError::Empty);
    }
    for share in shares {
        if share.debtor == *creditor {
            return Err(SplitError::SelfDebt(creditor.clone()));
        }
        if !share.amount.is_positive() {
            return Err(SplitError::NonPositive(share.debtor.clone()));
        }
        share
            .amount
            .to_wei()
            .map_err(|e| SplitError::Unrepresentable(share.debtor.clone(), e.to_string()))?;
    }
    Ok(())
}
