pub mod record;
pub mod stats;
pub mod store;

pub use record::{SignalRecord, SignalResult, Snapshot, TradeRecommendation};
pub use stats::SignalStats;
pub use store::{AppendOutcome, RecentOrder, SignalStore, Submission};
