//! Application-wide constants
//!
//! Limits that define the store's invariants live here so every component
//! agrees on them.

use std::time::Duration;

/// Signal store limits
pub mod store {
    /// Hard cap on retained signals; oldest are evicted first
    pub const MAX_SIGNALS: usize = 50;

    /// Size of the rolling view handed to readers
    pub const ROLLING_WINDOW: usize = 30;

    /// Characters of the raw message kept on each record for audit
    pub const EXCERPT_CHARS: usize = 200;
}

/// Message tokens recognised by the parser
pub mod tokens {
    pub const PERIOD_ID: &str = "period ID:";
    pub const QUANTITY: &str = "quantity:";

    pub const WIN_MARKERS: [&str; 2] = ["Result:Win", "Result\u{1F389}"];
    pub const LOSE_MARKERS: [&str; 2] = ["Result:Lose", "Lose\u{1F494}"];

    /// Green circle followed by a heavy check mark
    pub const GREEN_CHECK: &str = "\u{1F7E2}\u{2714}\u{FE0F}";
    pub const RED_CHECK: &str = "\u{1F534}\u{2714}\u{FE0F}";
}

/// Remote snapshot storage
pub mod storage {
    use super::*;

    /// Well-known object key the snapshot is always written to
    pub const SNAPSHOT_KEY: &str = "signals_data.json";

    pub const CONTENT_TYPE: &str = "application/json";

    /// R2 ignores the region but SigV4 still needs one in the scope
    pub const DEFAULT_REGION: &str = "auto";

    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

    /// Timestamp layout used for each persisted signal
    pub const RECORD_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
}

/// Transport reconnect policy
pub mod transport {
    pub const RECONNECT_BASE_DELAY_MS: u64 = 1_000;
    pub const RECONNECT_MAX_DELAY_MS: u64 = 60_000;
    pub const RECONNECT_MAX_JITTER_MS: u64 = 1_000;

    /// Long-poll timeout passed to Telegram getUpdates
    pub const TELEGRAM_POLL_TIMEOUT_SECS: u64 = 30;

    pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
}

/// Defaults for the ambient services
pub mod defaults {
    use super::*;

    pub const API_BIND: &str = "0.0.0.0:3000";

    /// Cron expression for the status reporter (every 3 seconds)
    pub const STATUS_SCHEDULE: &str = "*/3 * * * * *";

    pub const DIAGNOSTIC_BUS_CAPACITY: usize = 256;

    pub const CONFIG_PATH: &str = "config.yaml";

    /// Upper bound on draining queued snapshots at shutdown
    pub const SHUTDOWN_FLUSH_TIMEOUT: Duration = Duration::from_secs(20);
}

/// Logging event names for structured logging
pub mod events {
    pub const PARSE_SKIPPED: &str = "parse_skipped";
    pub const MALFORMED_QUANTITY: &str = "malformed_quantity";
}
