//! Pure computation over ledger reads: no I/O, no clocks.

pub mod balance;
pub mod normalizer;
pub mod score_projector;
pub mod split;
pub mod timeline;

pub use balance::aggregate;
pub use normalizer::{normalize, normalize_all};
pub use score_projector::{project, ScorePoint};
pub use split::{equal_shares, itemized_share, Currency, ShareError};
pub use timeline::{select, SettlementClock, TimelineBuilder};
