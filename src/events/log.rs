//! Append-only event log.

use crate::config::Retention;
use crate::types::{Event, EventId, LastEventId};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::VecDeque;

/// Log contents guarded by the log lock.
struct LogState {
    /// Retained events, oldest first. Ids are contiguous.
    events: VecDeque<Event>,

    /// Next id to assign. Also the count of events ever appended.
    next_id: u64,
}

impl LogState {
    fn first_retained(&self) -> Option<EventId> {
        self.events.front().and_then(|e| e.id)
    }

    fn events_from(&self, last: LastEventId) -> impl Iterator<Item = &Event> {
        let first_missing = last.first_missing().0;
        let oldest = self.next_id - self.events.len() as u64;
        let skip = first_missing.saturating_sub(oldest) as usize;
        self.events.iter().skip(skip)
    }
}

/// Ordered, in-memory log of broadcast events.
///
/// Writers (append) take the write lock; listing and replay take the read
/// lock. Callers that need the lock held across a compound operation use
/// [`EventLog::read`] and [`EventLog::write`].
pub struct EventLog {
    state: RwLock<LogState>,
    retention: Retention,
}

impl EventLog {
    /// Create an empty log that never evicts.
    pub fn new() -> Self {
        Self::with_retention(Retention::Unbounded)
    }

    /// Create an empty log with the given retention policy.
    pub fn with_retention(retention: Retention) -> Self {
        Self {
            state: RwLock::new(LogState {
                events: VecDeque::new(),
                next_id: 0,
            }),
            retention,
        }
    }

    /// Acquire the read lock.
    pub fn read(&self) -> LogReader<'_> {
        LogReader {
            state: self.state.read(),
        }
    }

    /// Acquire the write lock.
    pub fn write(&self) -> LogWriter<'_> {
        LogWriter {
            state: self.state.write(),
            retention: self.retention,
        }
    }

    /// Append an event and return it with its assigned id.
    pub fn append(&self, name: Option<String>, data: Vec<u8>) -> Event {
        self.write().append(name, data)
    }

    /// Count of events ever appended (the next id to be assigned).
    pub fn size(&self) -> u64 {
        self.read().size()
    }

    /// All retained events with an id greater than `last`, in order.
    pub fn events_from(&self, last: LastEventId) -> Vec<Event> {
        self.read().events_from(last).cloned().collect()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared view of the log, holding the read lock.
pub struct LogReader<'a> {
    state: RwLockReadGuard<'a, LogState>,
}

impl LogReader<'_> {
    pub fn size(&self) -> u64 {
        self.state.next_id
    }

    /// Number of events still held for replay.
    pub fn retained(&self) -> usize {
        self.state.events.len()
    }

    pub fn first_retained(&self) -> Option<EventId> {
        self.state.first_retained()
    }

    pub fn events_from(&self, last: LastEventId) -> impl Iterator<Item = &Event> {
        self.state.events_from(last)
    }

    /// Payloads of all retained events, as text.
    pub fn items(&self) -> Vec<String> {
        self.state
            .events
            .iter()
            .map(|e| e.data_str().into_owned())
            .collect()
    }
}

/// Exclusive view of the log, holding the write lock.
pub struct LogWriter<'a> {
    state: RwLockWriteGuard<'a, LogState>,
    retention: Retention,
}

impl LogWriter<'_> {
    /// Append an event, assigning the next id and evicting per retention.
    pub fn append(&mut self, name: Option<String>, data: Vec<u8>) -> Event {
        let id = EventId(self.state.next_id);
        self.state.next_id += 1;

        let event = Event {
            id: Some(id),
            name,
            data,
            comment: None,
            retry: None,
        };

        self.state.events.push_back(event.clone());

        if let Retention::Bounded(cap) = self.retention {
            while self.state.events.len() > cap {
                self.state.events.pop_front();
            }
        }

        event
    }

    pub fn size(&self) -> u64 {
        self.state.next_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn append_items(log: &EventLog, items: &[&str]) {
        for item in items {
            log.append(None, item.as_bytes().to_vec());
        }
    }

    fn ids(events: &[Event]) -> Vec<u64> {
        events.iter().map(|e| e.id.unwrap().0).collect()
    }

    #[test]
    fn test_ids_are_contiguous_from_zero() {
        let log = EventLog::new();
        let a = log.append(None, b"a".to_vec());
        let b = log.append(Some("named".into()), b"b".to_vec());

        assert_eq!(a.id, Some(EventId(0)));
        assert_eq!(b.id, Some(EventId(1)));
        assert_eq!(b.name.as_deref(), Some("named"));
        assert_eq!(log.size(), 2);
    }

    #[test]
    fn test_events_from() {
        let log = EventLog::new();
        append_items(&log, &["a", "b", "c"]);

        assert_eq!(ids(&log.events_from(LastEventId::NONE)), vec![0, 1, 2]);
        assert_eq!(ids(&log.events_from(LastEventId(0))), vec![1, 2]);
        assert!(log.events_from(LastEventId(2)).is_empty());
        assert!(log.events_from(LastEventId(40)).is_empty());
    }

    #[test]
    fn test_events_from_is_restartable() {
        let log = EventLog::new();
        append_items(&log, &["a", "b"]);

        let first = log.events_from(LastEventId(0));
        let second = log.events_from(LastEventId(0));
        assert_eq!(first, second);
    }

    #[test]
    fn test_bounded_retention_keeps_ids() {
        let log = EventLog::with_retention(Retention::Bounded(2));
        append_items(&log, &["a", "b", "c", "d"]);

        assert_eq!(log.size(), 4);
        let reader = log.read();
        assert_eq!(reader.retained(), 2);
        assert_eq!(reader.first_retained(), Some(EventId(2)));
        assert_eq!(reader.items(), vec!["c", "d"]);
        drop(reader);

        // Cursor older than the retained window replays what is left.
        assert_eq!(ids(&log.events_from(LastEventId(0))), vec![2, 3]);
        assert_eq!(ids(&log.events_from(LastEventId(2))), vec![3]);
    }

    #[test]
    fn test_zero_retention() {
        let log = EventLog::with_retention(Retention::Bounded(0));
        append_items(&log, &["a"]);

        assert_eq!(log.size(), 1);
        assert!(log.events_from(LastEventId::NONE).is_empty());
    }
}
