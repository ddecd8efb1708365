use crate::datasource::{DataSourceError, LedgerSource};
use crate::domain::{Address, DebtId, DebtRecord};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Fetches every ledger record a user takes part in.
#[derive(Debug, Clone)]
pub struct LedgerReader {
    source: Arc<dyn LedgerSource>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadResult {
    pub records: Vec<DebtRecord>,
    /// Ids whose individual read failed and were left out.
    pub failed_ids: Vec<DebtId>,
}

impl LedgerReader {
    pub fn new(source: Arc<dyn LedgerSource>) -> Self {
        Self { source }
    }

    /// List the owner's ids, then fetch them in one batch.
    ///
    /// Duplicate ids are collapsed. A failed id listing fails the read;
    /// failed record reads are dropped and reported in `failed_ids`.
    pub async fn read(&self, owner: &Address) -> Result<ReadResult, DataSourceError> {
        let ids: Vec<DebtId> = self
            .source
            .fetch_debt_ids(owner)
            .await?
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        if ids.is_empty() {
            return Ok(ReadResult::default());
        }

        let mut result = ReadResult::default();
        for (id, read) in self.source.fetch_debts(&ids).await? {
            match read {
                Ok(record) => result.records.push(record),
                Err(e) => {
                    warn!("Dropping debt {} for {}: {}", id, owner, e);
                    result.failed_ids.push(id);
                }
            }
        }

        debug!(
            "Read {} debts for {} ({} failed)",
            result.records.len(),
            owner,
            result.failed_ids.len()
        );
        Ok(result)
    }

    /// Fetch a single record by id.
    pub async fn read_one(&self, id: DebtId) -> Result<DebtRecord, DataSourceError> {
        self.source
            .fetch_debts(&[id])
            .await?
            .into_iter()
            .find(|(read_id, _)| *read_id == id)
            .map(|(_, read)| read)
            .unwrap_or_else(|| Err(DataSourceError::Other(format!("Debt {} not returned", id))))
    }
}
