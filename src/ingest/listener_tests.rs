//! Unit tests for the ingestion listener and allow-list.

#[cfg(test)]
mod listener_tests {
    use crate::bus::DiagnosticBus;
    use crate::data::store::{SignalStore, Submission};
    use crate::events::{ChannelRef, Diagnostic, InboundMessage};
    use crate::ingest::{AllowList, IngestOutcome, IngestionListener, MessageHandler};
    use crate::parser::SkipReason;
    use chrono::Utc;

    const SIGNAL: &str = "period ID: 202510170350\nResult:Win\nTrade: 🟢✔️";

    fn message(channel: ChannelRef, text: &str) -> InboundMessage {
        InboundMessage {
            channel,
            text: text.to_string(),
            received_at: Utc::now(),
        }
    }

    fn listener(entries: &[&str]) -> (IngestionListener, SignalStore, DiagnosticBus) {
        let bus = DiagnosticBus::new(32);
        let store = SignalStore::new();
        let listener = IngestionListener::new(store.clone(), AllowList::new(entries), bus.clone());
        (listener, store, bus)
    }

    // ============= Allow-list =============

    #[test]
    fn test_allow_list_normalizes_names() {
        let list = AllowList::new(["@SignalChannel", " other ", ""]);
        assert_eq!(list.len(), 2);
        assert!(list.permits(&ChannelRef::named("signalchannel")));
        assert!(list.permits(&ChannelRef::named("@SIGNALCHANNEL")));
        assert!(list.permits(&ChannelRef::named("Other")));
        assert!(!list.permits(&ChannelRef::named("stranger")));
    }

    #[test]
    fn test_allow_list_numeric_entries_match_ids() {
        let list = AllowList::new(["-1001234567890"]);
        assert!(list.permits(&ChannelRef::with_id(-1001234567890)));
        assert!(!list.permits(&ChannelRef::with_id(42)));
        assert!(!list.permits(&ChannelRef::named("-1001234567890")));
    }

    #[test]
    fn test_allow_list_either_identity_matches() {
        let list = AllowList::new(["signals"]);
        let channel = ChannelRef {
            name: Some("signals".to_string()),
            id: Some(7),
        };
        assert!(list.permits(&channel));
    }

    #[test]
    fn test_empty_allow_list_admits_nothing() {
        let list = AllowList::new(Vec::<String>::new());
        assert!(list.is_empty());
        assert!(!list.permits(&ChannelRef::named("anything")));
        assert!(!list.permits(&ChannelRef::default()));
    }

    // ============= Listener =============

    #[test]
    fn test_filtered_message_never_reaches_store() {
        let (listener, store, bus) = listener(&["signals"]);
        let mut rx = bus.subscribe();

        let outcome = listener.handle(message(ChannelRef::named("elsewhere"), SIGNAL));

        assert_eq!(outcome, IngestOutcome::Filtered);
        assert!(store.is_empty());
        match rx.try_recv().unwrap() {
            Diagnostic::MessageFiltered { channel } => assert_eq!(channel, "@elsewhere"),
            other => panic!("Expected MessageFiltered, got {:?}", other),
        }
        // Parser never ran, so nothing else was reported.
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_allowed_signal_is_accepted() {
        let (listener, store, _bus) = listener(&["@Signals"]);

        let outcome = listener.handle(message(ChannelRef::named("signals"), SIGNAL));

        match outcome {
            IngestOutcome::Processed(Submission::Accepted(record)) => {
                assert_eq!(record.period_id(), "202510170350");
            }
            other => panic!("Expected accepted signal, got {:?}", other),
        }
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_received_at_comes_from_message() {
        let (listener, store, _bus) = listener(&["100"]);
        let mut msg = message(ChannelRef::with_id(100), SIGNAL);
        msg.received_at = chrono::DateTime::<Utc>::UNIX_EPOCH;

        listener.handle(msg);
        assert_eq!(store.latest().unwrap().received_at().timestamp(), 0);
    }

    #[test]
    fn test_duplicate_signal_reported() {
        let (listener, store, _bus) = listener(&["100"]);

        listener.handle(message(ChannelRef::with_id(100), SIGNAL));
        let outcome = listener.handle(message(ChannelRef::with_id(100), SIGNAL));

        assert_eq!(
            outcome,
            IngestOutcome::Processed(Submission::Duplicate("202510170350".to_string()))
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_chatter_is_not_a_signal() {
        let (listener, store, bus) = listener(&["signals"]);
        let mut rx = bus.subscribe();

        let outcome = listener.handle(message(ChannelRef::named("signals"), "gm everyone"));

        assert_eq!(
            outcome,
            IngestOutcome::Processed(Submission::NotASignal(SkipReason::MissingPeriodId))
        );
        assert!(store.is_empty());
        match rx.try_recv().unwrap() {
            Diagnostic::ParseSkipped { channel, reason } => {
                assert_eq!(channel.as_deref(), Some("@signals"));
                assert_eq!(reason, SkipReason::MissingPeriodId);
            }
            other => panic!("Expected ParseSkipped, got {:?}", other),
        }
    }

    #[test]
    fn test_listener_with_empty_allow_list_filters_everything() {
        let (listener, store, _bus) = listener(&[]);
        assert_eq!(
            listener.handle(message(ChannelRef::named("signals"), SIGNAL)),
            IngestOutcome::Filtered
        );
        assert!(store.is_empty());
    }
}
