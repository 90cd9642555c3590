//! Item store tying the event log, broadcaster and reconnect policy together.

use crate::broadcast::{BroadcastListener, Broadcaster, EventSink};
use crate::command::Command;
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::events::EventLog;
use crate::types::{Event, EventId, LastEventId};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Name of the event announcing the item count after each addition.
pub const SIZE_EVENT: &str = "size";

/// What was sent to a sink before it joined the live stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub replayed: usize,
    pub first_replayed: Option<EventId>,
}

/// A single stream of items, pushed to every connected client.
///
/// Lock order is always log, then broadcaster slot, then sink registry:
/// - `add_item` holds the log write lock while it broadcasts.
/// - `item_events` holds the log read lock across replay and registration,
///   so a reconnecting client sees each event exactly once.
pub struct ItemStore {
    /// Item events, in sequence order.
    log: EventLog,

    /// Lazily created on first registration, discarded on disconnect.
    broadcaster: Mutex<Option<Arc<Broadcaster>>>,

    /// Hooks attached to every broadcaster this store creates.
    listeners: RwLock<Vec<Arc<dyn BroadcastListener>>>,

    /// Seconds a reconnecting client is told to wait. Zero allows reconnects.
    reconnect_delay: AtomicU64,
}

impl ItemStore {
    /// Create a store with default configuration.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            log: EventLog::with_retention(config.retention),
            broadcaster: Mutex::new(None),
            listeners: RwLock::new(Vec::new()),
            reconnect_delay: AtomicU64::new(config.initial_reconnect_delay),
        }
    }

    /// Attach observer hooks to the current and all future broadcasters.
    pub fn add_listener(&self, listener: Arc<dyn BroadcastListener>) {
        // Held across both steps so a broadcaster created concurrently
        // cannot miss the hook.
        let slot = self.broadcaster.lock();
        if let Some(broadcaster) = slot.as_ref() {
            broadcaster.add_listener(Arc::clone(&listener));
        }
        self.listeners.write().push(listener);
    }

    // --- Items ---

    /// Store an item and push it to every connected client.
    ///
    /// Two events go out: the item itself (unnamed, carrying its id) and a
    /// `size` event with the new item count. Empty names are ignored.
    pub fn add_item(&self, name: &str) -> Option<Event> {
        if name.is_empty() {
            debug!("Ignoring item without a name");
            return None;
        }

        let mut log = self.log.write();
        let event = log.append(None, name.as_bytes().to_vec());
        let size = log.size();

        if let Some(broadcaster) = self.current_broadcaster() {
            broadcaster.broadcast(&event);
            broadcaster.broadcast(&Event::text(size.to_string()).with_name(SIZE_EVENT));
        }

        info!(id = ?event.id, item = name, "Item added");
        Some(event)
    }

    /// Snapshot of the stored items, formatted as `[a, b, c]`.
    pub fn list_items(&self) -> String {
        let items = self.log.read().items();
        format!("[{}]", items.join(", "))
    }

    /// Count of items ever added.
    pub fn item_count(&self) -> u64 {
        self.log.size()
    }

    // --- Connections ---

    /// Attach a client sink to the stream.
    ///
    /// A reconnecting client (`last_event_id >= 0`) is rejected while a
    /// reconnect delay is set; otherwise it is first replayed every event it
    /// missed. A replay failure closes the sink and leaves it unregistered.
    pub fn item_events(
        &self,
        last_event_id: LastEventId,
        sink: Arc<dyn EventSink>,
    ) -> Result<ReplaySummary> {
        if last_event_id.is_reconnect() {
            info!(last_event_id = last_event_id.0, "Received last event id");

            let delay = self.reconnect_delay();
            if delay > 0 {
                info!(delay, "Non-zero reconnect delay, rejecting reconnect");
                return Err(StoreError::ServiceUnavailable { retry_after: delay });
            }
        }

        let log = self.log.read();
        let mut summary = ReplaySummary::default();

        if last_event_id.is_reconnect() {
            if let Some(first) = log.first_retained() {
                if first > last_event_id.first_missing() {
                    warn!(
                        last_event_id = last_event_id.0,
                        oldest = first.0,
                        "Missed events already evicted, replaying from oldest retained"
                    );
                }
            }

            for event in log.events_from(last_event_id) {
                let event_id = event.id.unwrap_or_default();
                if let Err(source) = sink.send(event) {
                    error!(event_id = event_id.0, error = %source, "Error replaying missed events");
                    sink.close();
                    return Err(StoreError::Replay { event_id, source });
                }
                summary.replayed += 1;
                summary.first_replayed.get_or_insert(event_id);
            }
            debug!(replayed = summary.replayed, "Replay complete");
        }

        // Registration stays under the log read lock and the slot lock, so no
        // item is appended and no disconnect happens in between.
        let mut slot = self.broadcaster.lock();
        let broadcaster = slot.get_or_insert_with(|| self.create_broadcaster());
        if !broadcaster.register(sink) {
            error!("Unable to add new event sink to the broadcaster");
            return Err(StoreError::RegistrationRejected);
        }

        Ok(summary)
    }

    /// Number of currently connected sinks.
    pub fn connected_sinks(&self) -> usize {
        self.current_broadcaster()
            .map(|b| b.sink_count())
            .unwrap_or(0)
    }

    pub fn has_broadcaster(&self) -> bool {
        self.broadcaster.lock().is_some()
    }

    fn current_broadcaster(&self) -> Option<Arc<Broadcaster>> {
        self.broadcaster.lock().clone()
    }

    fn create_broadcaster(&self) -> Arc<Broadcaster> {
        let broadcaster = Broadcaster::new();
        for listener in self.listeners.read().iter() {
            broadcaster.add_listener(Arc::clone(listener));
        }
        info!("Broadcaster created");
        Arc::new(broadcaster)
    }

    // --- Administration ---

    /// Run an administrative command, returning a status message.
    pub fn process_command(&self, text: &str) -> Result<String> {
        let command: Command = text.parse().map_err(|e| {
            warn!(command = text, "Command not recognized");
            e
        })?;

        match command {
            Command::Disconnect => {
                let closed = self.disconnect();
                info!(closed, "Disconnected all sinks");
                Ok("Disconnected.".to_string())
            }
            Command::Reconnect(delay) => {
                self.reconnect_delay.store(delay, Ordering::SeqCst);
                info!(delay, "Reconnect strategy updated");
                let when = if delay == 0 {
                    "now".to_string()
                } else {
                    delay.to_string()
                };
                Ok(format!("Reconnect strategy updated: {}", when))
            }
        }
    }

    /// Close all sinks and discard the broadcaster. Returns the number closed.
    pub fn disconnect(&self) -> usize {
        let broadcaster = self.broadcaster.lock().take();
        broadcaster.map(|b| b.shutdown()).unwrap_or(0)
    }

    /// Current reconnect delay in seconds.
    pub fn reconnect_delay(&self) -> u64 {
        self.reconnect_delay.load(Ordering::SeqCst)
    }
}

impl Default for ItemStore {
    fn default() -> Self {
        Self::new()
    }
}
