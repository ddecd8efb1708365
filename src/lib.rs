pub mod api;
pub mod config;
pub mod datasource;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;
pub mod receipt;

pub use config::Config;
pub use datasource::{
    DataSourceError, EvmRpcSource, LedgerSource, LedgerWriter, MockLedgerSource, ScoreSource,
};
pub use domain::{
    Address, BalanceSummary, DebtId, DebtRecord, Decimal, DirectedDebt, EventKind, ScoreSnapshot,
    TimeSecs, TimelineEvent,
};
pub use error::AppError;
