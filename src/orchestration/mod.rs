//! Wiring between the external seams and the pure engine.

pub mod poller;
pub mod reader;
pub mod service;
pub mod splitter;

pub use poller::{LedgerPoller, PollerHandle, PollerRegistry, ViewReceiver};
pub use reader::{LedgerReader, ReadResult};
pub use service::{LedgerService, LedgerView, ScoreView};
pub use splitter::{
    SplitError, SplitExecutor, SplitFailure, SplitOutcome, SplitProgress, SplitShare,
};
