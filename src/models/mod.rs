//! Data models for raw rows, transactions, cleaning reports and analytics.

mod raw;
mod report;
mod summary;
mod transaction;

pub use raw::RawRow;
pub use report::{CleaningReport, RejectReason};
pub use summary::{
    ActionVolume, AnalyticsSummary, NetPosition, PriceStats, TickerVolume, TimeAnalysis,
    TraderActivity, VolumeBreakdown,
};
pub use transaction::{Action, Transaction};
