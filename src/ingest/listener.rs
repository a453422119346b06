use tracing::{debug, info};

use crate::bus::DiagnosticBus;
use crate::data::store::{SignalStore, Submission};
use crate::events::{Diagnostic, InboundMessage};
use crate::parser;

use super::allow_list::AllowList;

#[derive(Clone, Debug, PartialEq)]
pub enum IngestOutcome {
    /// Channel not on the allow-list; the parser never saw the text
    Filtered,
    Processed(Submission),
}

/// Invoked by a transport adapter once per inbound message.
pub trait MessageHandler: Send + Sync {
    fn handle(&self, message: InboundMessage) -> IngestOutcome;
}

/// Filters by allow-list and feeds accepted text through the parser into
/// the store.
#[derive(Clone)]
pub struct IngestionListener {
    store: SignalStore,
    allow_list: AllowList,
    diagnostics: DiagnosticBus,
}

impl IngestionListener {
    pub fn new(store: SignalStore, allow_list: AllowList, diagnostics: DiagnosticBus) -> Self {
        Self {
            store,
            allow_list,
            diagnostics,
        }
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }
}

impl MessageHandler for IngestionListener {
    fn handle(&self, message: InboundMessage) -> IngestOutcome {
        if !self.allow_list.permits(&message.channel) {
            debug!("Ignoring message from {}", message.channel);
            self.diagnostics.publish(Diagnostic::MessageFiltered {
                channel: message.channel.to_string(),
            });
            return IngestOutcome::Filtered;
        }

        let preview: String = message.text.chars().take(100).collect();
        info!("📨 New message from {}: {}...", message.channel, preview);

        let outcome = parser::parse_detailed(&message.text, message.received_at);
        IngestOutcome::Processed(self.store.submit_parsed(outcome, Some(&message.channel)))
    }
}
