pub mod allow_list;
pub mod listener;
pub mod telegram;
pub mod transport;
pub mod ws_relay;

pub use allow_list::AllowList;
pub use listener::{IngestOutcome, IngestionListener, MessageHandler};
pub use transport::{build_transport, Backoff, MessageTransport};

#[cfg(test)]
mod listener_tests;
