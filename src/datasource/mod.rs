//! Seams to the external ledger and score contracts.

use crate::domain::{Address, DebtId, DebtRecord, Decimal, ScoreSnapshot, TxHash};
use async_trait::async_trait;
use std::fmt;

pub mod abi;
pub mod evm_rpc;
pub mod mock;

pub use evm_rpc::EvmRpcSource;
pub use mock::MockLedgerSource;

/// Result of one id in a batched record read.
pub type DebtReadResult = (DebtId, Result<DebtRecord, DataSourceError>);

/// Read side of the debt ledger contract.
#[async_trait]
pub trait LedgerSource: Send + Sync + fmt::Debug {
    /// Ids of every record in which `owner` is creditor or debtor.
    ///
    /// No ordering is implied and duplicates are possible.
    async fn fetch_debt_ids(&self, owner: &Address) -> Result<Vec<DebtId>, DataSourceError>;

    /// Fetch all records in one batched request.
    ///
    /// The outer error is reserved for failures of the batch as a whole;
    /// per-id failures are reported inline so callers can drop them.
    async fn fetch_debts(&self, ids: &[DebtId]) -> Result<Vec<DebtReadResult>, DataSourceError>;
}

/// Write side of the debt ledger contract.
///
/// Both calls resolve only once the transaction is confirmed.
#[async_trait]
pub trait LedgerWriter: Send + Sync + fmt::Debug {
    async fn add_debt(
        &self,
        from: &Address,
        creditor: &Address,
        debtor: &Address,
        amount: Decimal,
    ) -> Result<TxHash, DataSourceError>;

    async fn settle_debt(&self, from: &Address, id: DebtId) -> Result<TxHash, DataSourceError>;
}

/// The scoring contract.
#[async_trait]
pub trait ScoreSource: Send + Sync + fmt::Debug {
    async fn fetch_score(&self, user: &Address) -> Result<u32, DataSourceError>;

    async fn fetch_score_details(&self, user: &Address) -> Result<ScoreSnapshot, DataSourceError>;

    async fn fetch_borrowing_power(&self, user: &Address) -> Result<Decimal, DataSourceError>;
}

/// Error type for data source operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSourceError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// HTTP error (e.g., 429 rate limit, 5xx server error)
    HttpError { status: u16, message: String },
    /// Parsing error (invalid JSON, malformed ABI data)
    ParseError(String),
    /// JSON-RPC error object returned by the node
    RpcError { code: i64, message: String },
    /// Rate limit exceeded
    RateLimited,
    /// Transaction mined but reverted
    Reverted(TxHash),
    /// No receipt within the confirmation window
    Timeout(String),
    /// Other error
    Other(String),
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            DataSourceError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            DataSourceError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            DataSourceError::RpcError { code, message } => {
                write!(f, "RPC error {}: {}", code, message)
            }
            DataSourceError::RateLimited => write!(f, "Rate limited"),
            DataSourceError::Reverted(hash) => write!(f, "Transaction {} reverted", hash),
            DataSourceError::Timeout(msg) => write!(f, "Timed out: {}", msg),
            DataSourceError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for DataSourceError {}
