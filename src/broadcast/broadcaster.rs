//! Fan-out of events to every registered sink.

use super::registry::SinkRegistry;
use super::sink::{EventSink, SinkId};
use crate::error::SinkError;
use crate::types::Event;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Observer hooks supplied by the transport layer.
pub trait BroadcastListener: Send + Sync {
    /// A sink failed during broadcast and was removed.
    fn on_error(&self, _sink: SinkId, _error: &SinkError) {}

    /// A sink was closed and removed.
    fn on_close(&self, _sink: SinkId) {}
}

/// Outcome of one broadcast.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BroadcastStats {
    pub delivered: usize,
    pub dropped: usize,
}

/// Delivers events to all registered sinks.
///
/// A failing sink is removed and reported to the listeners; delivery to
/// the remaining sinks continues.
pub struct Broadcaster {
    sinks: SinkRegistry,
    listeners: RwLock<Vec<Arc<dyn BroadcastListener>>>,
    shut_down: AtomicBool,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self {
            sinks: SinkRegistry::new(),
            listeners: RwLock::new(Vec::new()),
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn BroadcastListener>) {
        self.listeners.write().push(listener);
    }

    /// Register a sink for future broadcasts.
    ///
    /// Returns false if the broadcaster is shut down or the sink is already
    /// registered.
    pub fn register(&self, sink: Arc<dyn EventSink>) -> bool {
        if self.is_shut_down() {
            return false;
        }
        let id = sink.id();
        if !self.sinks.insert(sink) {
            return false;
        }
        // Lost a race with shutdown; its drain may have missed us.
        if self.is_shut_down() {
            self.sinks.remove(id);
            return false;
        }
        debug!(sink = id.0, "Sink registered");
        true
    }

    /// Send an event to every registered sink.
    pub fn broadcast(&self, event: &Event) -> BroadcastStats {
        let mut stats = BroadcastStats::default();

        for sink in self.sinks.snapshot() {
            let id = sink.id();

            if sink.is_closed() {
                if self.sinks.remove(id).is_some() {
                    debug!(sink = id.0, "Removing closed sink");
                    self.notify_close(id);
                }
                stats.dropped += 1;
                continue;
            }

            match sink.send(event) {
                Ok(()) => stats.delivered += 1,
                Err(e) => {
                    stats.dropped += 1;
                    if self.sinks.remove(id).is_some() {
                        warn!(sink = id.0, error = %e, "Dropping sink after failed write");
                        sink.close();
                        self.notify_error(id, &e);
                    }
                }
            }
        }

        stats
    }

    /// Close and remove every sink. The broadcaster remains usable.
    pub fn close_all(&self) -> usize {
        let sinks = self.sinks.drain();
        for sink in &sinks {
            sink.close();
            self.notify_close(sink.id());
        }
        sinks.len()
    }

    /// Close every sink and refuse further registrations.
    pub fn shutdown(&self) -> usize {
        self.shut_down.store(true, Ordering::SeqCst);
        self.close_all()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    pub fn contains(&self, id: SinkId) -> bool {
        self.sinks.contains(id)
    }

    fn notify_error(&self, id: SinkId, error: &SinkError) {
        for listener in self.listeners.read().iter() {
            listener.on_error(id, error);
        }
    }

    fn notify_close(&self, id: SinkId) {
        for listener in self.listeners.read().iter() {
            listener.on_close(id);
        }
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}
