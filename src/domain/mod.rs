//! Domain types for the debt ledger view model.
//!
//! This module provides:
//! - Lossless money handling via the Decimal wrapper and its single
//!   fixed-point conversion
//! - Domain primitives: TimeSecs, Address, DebtId, TxHash
//! - Ledger records and the directed/aggregated views derived from them
//! - Timeline events with their deterministic ordering keys
//! - Score snapshots and receipt data from external services

pub mod debt;
pub mod decimal;
pub mod ordering;
pub mod primitives;
pub mod receipt;
pub mod score;
pub mod timeline;

pub use alloy_primitives::U256;
pub use debt::{BalanceSummary, DebtRecord, DirectedDebt};
pub use decimal::{AmountError, Decimal};
pub use ordering::EventOrderingKey;
pub use primitives::{Address, AddressParseError, DebtId, DebtIdParseError, TimeSecs, TxHash};
pub use receipt::{ReceiptData, ReceiptItem};
pub use score::{ScoreSnapshot, ScoreTier};
pub use timeline::{EventKind, KindFilter, SortOrder, TimelineEvent, TimelineQuery};
