//! Error handling and edge case tests.

use eventstore::{
    BroadcastListener, ChannelSink, ErrorKind, Event, EventSink, ItemStore, LastEventId, SinkError,
    SinkId, StoreError, WriterSink,
};
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;

/// Writer that accepts a fixed number of flushed events, then fails.
struct FlakyWriter {
    events_left: usize,
}

impl Write for FlakyWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.events_left == 0 {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "connection reset"));
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.events_left = self.events_left.saturating_sub(1);
        Ok(())
    }
}

#[derive(Default)]
struct Recorder {
    errors: Mutex<Vec<(SinkId, String)>>,
    closed: Mutex<Vec<SinkId>>,
}

impl BroadcastListener for Recorder {
    fn on_error(&self, sink: SinkId, error: &SinkError) {
        self.errors.lock().push((sink, error.to_string()));
    }

    fn on_close(&self, sink: SinkId) {
        self.closed.lock().push(sink);
    }
}

// --- Bad commands ---

#[test]
fn test_unrecognized_command() {
    let store = ItemStore::new();

    let err = store.process_command("explode").unwrap_err();
    assert!(matches!(err, StoreError::BadCommand(ref text) if text == "explode"));
    assert_eq!(err.kind(), ErrorKind::ClientError);
    assert_eq!(err.kind().status_code(), 400);
    assert!(err.to_string().contains("'explode'"));
}

#[test]
fn test_malformed_reconnect_delay_leaves_state_unchanged() {
    let store = ItemStore::new();
    store.process_command("reconnect 7").unwrap();

    for text in ["reconnect soon", "reconnect -3", "reconnect 1.5", "reconnect"] {
        let err = store.process_command(text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ClientError);
    }
    assert_eq!(store.reconnect_delay(), 7);
}

// --- Replay failures ---

#[test]
fn test_replay_failure_does_not_register() {
    let store = ItemStore::new();
    for item in ["a", "b", "c"] {
        store.add_item(item);
    }

    // Accepts event 1, fails on event 2.
    let sink = WriterSink::new(FlakyWriter { events_left: 1 });
    let err = store.item_events(LastEventId(0), sink.clone()).unwrap_err();

    match err {
        StoreError::Replay { event_id, ref source } => {
            assert_eq!(event_id.0, 2);
            assert!(matches!(source, SinkError::Io(_)));
        }
        ref other => panic!("Expected Replay error, got {:?}", other),
    }
    assert_eq!(err.kind().status_code(), 500);
    assert!(sink.is_closed());
    assert_eq!(store.connected_sinks(), 0);
}

#[test]
fn test_replay_overflow_is_replay_error() {
    let store = ItemStore::new();
    for item in ["a", "b", "c", "d"] {
        store.add_item(item);
    }

    let (sink, receiver) = ChannelSink::new(2);
    let err = store.item_events(LastEventId(0), sink).unwrap_err();

    assert!(matches!(
        err,
        StoreError::Replay {
            source: SinkError::Overflow,
            ..
        }
    ));
    assert_eq!(receiver.drain().len(), 2);
    assert_eq!(store.connected_sinks(), 0);
}

// --- Broadcast failures ---

#[test]
fn test_broken_client_invisible_to_others() {
    let store = ItemStore::new();
    let recorder = Arc::new(Recorder::default());
    store.add_listener(recorder.clone());

    let broken = WriterSink::new(FlakyWriter { events_left: 0 });
    let broken_id = broken.id();
    store.item_events(LastEventId::NONE, broken).unwrap();

    let (healthy, receiver) = ChannelSink::new(16);
    store.item_events(LastEventId::NONE, healthy).unwrap();
    assert_eq!(store.connected_sinks(), 2);

    store.add_item("first");
    store.add_item("second");

    assert_eq!(store.connected_sinks(), 1);
    assert_eq!(receiver.drain().len(), 4);

    let errors = recorder.errors.lock();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, broken_id);
}

#[test]
fn test_disconnect_notifies_close_hooks() {
    let store = ItemStore::new();
    let recorder = Arc::new(Recorder::default());
    store.add_listener(recorder.clone());

    let (a, _ra) = ChannelSink::new(4);
    let (b, _rb) = ChannelSink::new(4);
    let ids = vec![a.id(), b.id()];
    store.item_events(LastEventId::NONE, a).unwrap();
    store.item_events(LastEventId::NONE, b).unwrap();

    store.process_command("disconnect").unwrap();

    let mut closed = recorder.closed.lock().clone();
    closed.sort();
    assert_eq!(closed, ids);
    assert!(recorder.errors.lock().is_empty());
}

#[test]
fn test_disconnect_without_clients() {
    let store = ItemStore::new();
    assert_eq!(store.process_command("disconnect").unwrap(), "Disconnected.");
    assert_eq!(store.disconnect(), 0);
}

#[test]
fn test_duplicate_sink_registration_rejected() {
    let store = ItemStore::new();
    let (sink, _rx) = ChannelSink::new(4);
    store.item_events(LastEventId::NONE, sink.clone()).unwrap();

    let err = store.item_events(LastEventId::NONE, sink).unwrap_err();
    assert!(matches!(err, StoreError::RegistrationRejected));
    assert_eq!(err.kind(), ErrorKind::InternalError);
}

#[test]
fn test_closed_channel_dropped_on_next_broadcast() {
    let store = ItemStore::new();
    let (sink, receiver) = ChannelSink::new(4);
    store.item_events(LastEventId::NONE, sink).unwrap();

    // Client goes away without telling anyone.
    drop(receiver);
    assert_eq!(store.connected_sinks(), 1);

    store.add_item("x");
    assert_eq!(store.connected_sinks(), 0);
    assert!(store.add_item("y").is_some());
}

#[test]
fn test_event_json_payload() {
    let event = Event::json("size", &serde_json::json!({ "count": 2 })).unwrap();
    assert_eq!(event.data_str(), r#"{"count":2}"#);
}
