//! Set of currently attached sinks.

use super::sink::{EventSink, SinkId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Concurrent set of sinks keyed by identity.
///
/// Broadcasting iterates a snapshot, so sinks added or removed during a
/// broadcast never cause a skip or a double send within that broadcast.
#[derive(Default)]
pub struct SinkRegistry {
    sinks: RwLock<HashMap<SinkId, Arc<dyn EventSink>>>,
}

impl SinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink. Returns false if a sink with the same id is present.
    pub fn insert(&self, sink: Arc<dyn EventSink>) -> bool {
        let mut sinks = self.sinks.write();
        let id = sink.id();
        if sinks.contains_key(&id) {
            return false;
        }
        sinks.insert(id, sink);
        true
    }

    pub fn remove(&self, id: SinkId) -> Option<Arc<dyn EventSink>> {
        self.sinks.write().remove(&id)
    }

    pub fn contains(&self, id: SinkId) -> bool {
        self.sinks.read().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sinks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.read().is_empty()
    }

    /// Copy of the current membership, ordered by sink id.
    pub fn snapshot(&self) -> Vec<Arc<dyn EventSink>> {
        let mut sinks: Vec<_> = self.sinks.read().values().cloned().collect();
        sinks.sort_by_key(|s| s.id());
        sinks
    }

    /// Remove and return every sink.
    pub fn drain(&self) -> Vec<Arc<dyn EventSink>> {
        let mut sinks: Vec<_> = self.sinks.write().drain().map(|(_, s)| s).collect();
        sinks.sort_by_key(|s| s.id());
        sinks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::ChannelSink;

    #[test]
    fn test_insert_rejects_duplicates() {
        let registry = SinkRegistry::new();
        let (sink, _rx) = ChannelSink::new(4);

        assert!(registry.insert(sink.clone()));
        assert!(!registry.insert(sink.clone()));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(sink.id()));
    }

    #[test]
    fn test_remove_and_drain() {
        let registry = SinkRegistry::new();
        let (a, _ra) = ChannelSink::new(4);
        let (b, _rb) = ChannelSink::new(4);
        registry.insert(a.clone());
        registry.insert(b.clone());

        assert!(registry.remove(a.id()).is_some());
        assert!(registry.remove(a.id()).is_none());

        let drained = registry.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].id(), b.id());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let registry = SinkRegistry::new();
        let (a, _ra) = ChannelSink::new(4);
        registry.insert(a.clone());

        let snapshot = registry.snapshot();
        registry.remove(a.id());
        assert_eq!(snapshot.len(), 1);
        assert!(registry.is_empty());
    }
}
