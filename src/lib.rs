//! Signal Watch - channel signal ingestion and performance tracking
//!
//! This library parses trading-signal broadcasts from monitored channels,
//! keeps a bounded deduplicated history with running statistics, and
//! persists snapshots to an S3-compatible object store.

pub mod api;
pub mod bus;
pub mod config;
pub mod constants;
pub mod data;
pub mod error;
pub mod events;
pub mod ingest;
pub mod parser;
pub mod persistence;
pub mod services;

// Re-export commonly used types
pub use bus::DiagnosticBus;
pub use config::AppConfig;
pub use data::{SignalRecord, SignalResult, SignalStats, SignalStore, Snapshot, TradeRecommendation};
pub use events::{ChannelRef, Diagnostic, InboundMessage};

#[cfg(test)]
mod config_tests;
