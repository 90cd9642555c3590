//! Output sinks, one per connected client.

use crate::config::StoreConfig;
use crate::error::SinkError;
use crate::events::write_event;
use crate::types::Event;
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Opaque identity of a sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SinkId(pub u64);

impl SinkId {
    /// Allocate a process-unique id.
    pub fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        SinkId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// An open output channel to one client.
///
/// Implemented per transport binding. `send` may be called concurrently from
/// broadcasting threads.
pub trait EventSink: Send + Sync {
    fn id(&self) -> SinkId;

    /// Deliver one event.
    fn send(&self, event: &Event) -> Result<(), SinkError>;

    /// Close the channel. Idempotent.
    fn close(&self);

    fn is_closed(&self) -> bool;
}

/// Non-blocking sink backed by a bounded channel.
///
/// The paired [`SinkReceiver`] is drained by whatever task writes to the
/// client. A full buffer or a dropped receiver fails the send.
pub struct ChannelSink {
    id: SinkId,
    sender: RwLock<Option<Sender<Event>>>,
}

impl ChannelSink {
    /// Create a sink with room for `buffer_size` undelivered events.
    ///
    /// The buffer holds at least one event; a zero-capacity channel would
    /// fail every send that has no receiver already waiting.
    pub fn new(buffer_size: usize) -> (Arc<Self>, SinkReceiver) {
        let id = SinkId::next();
        let (sender, receiver) = bounded(buffer_size.max(1));
        let sink = Arc::new(Self {
            id,
            sender: RwLock::new(Some(sender)),
        });
        (sink, SinkReceiver { id, receiver })
    }

    /// Create a sink sized by the store configuration.
    pub fn for_config(config: &StoreConfig) -> (Arc<Self>, SinkReceiver) {
        Self::new(config.sink_buffer_size)
    }
}

impl EventSink for ChannelSink {
    fn id(&self) -> SinkId {
        self.id
    }

    fn send(&self, event: &Event) -> Result<(), SinkError> {
        let sender = self.sender.read();
        let Some(sender) = sender.as_ref() else {
            return Err(SinkError::Closed);
        };
        match sender.try_send(event.clone()) {
            Ok(()) => Ok(()),
            Err(crossbeam_channel::TrySendError::Full(_)) => Err(SinkError::Overflow),
            Err(crossbeam_channel::TrySendError::Disconnected(_)) => Err(SinkError::Disconnected),
        }
    }

    fn close(&self) {
        // Dropping the sender ends the receiver's stream once drained.
        self.sender.write().take();
    }

    fn is_closed(&self) -> bool {
        self.sender.read().is_none()
    }
}

/// Receiving end of a [`ChannelSink`].
pub struct SinkReceiver {
    pub id: SinkId,
    receiver: Receiver<Event>,
}

impl SinkReceiver {
    /// Receive the next event (blocking). Fails once the sink is closed and drained.
    pub fn recv(&self) -> Result<Event, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<Event, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: Duration,
    ) -> Result<Event, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Take everything currently buffered.
    pub fn drain(&self) -> Vec<Event> {
        self.receiver.try_iter().collect()
    }

    /// Blocking iterator that ends when the sink is closed.
    pub fn iter(&self) -> crossbeam_channel::Iter<'_, Event> {
        self.receiver.iter()
    }
}

/// Blocking sink that writes the wire encoding to a stream.
///
/// Used when a worker thread is dedicated to each client connection.
pub struct WriterSink<W: Write + Send> {
    id: SinkId,
    writer: Mutex<W>,
    closed: AtomicBool,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Arc<Self> {
        Arc::new(Self {
            id: SinkId::next(),
            writer: Mutex::new(writer),
            closed: AtomicBool::new(false),
        })
    }
}

impl<W: Write + Send> EventSink for WriterSink<W> {
    fn id(&self) -> SinkId {
        self.id
    }

    fn send(&self, event: &Event) -> Result<(), SinkError> {
        if self.is_closed() {
            return Err(SinkError::Closed);
        }
        let mut writer = self.writer.lock();
        write_event(&mut *writer, event)?;
        writer.flush()?;
        Ok(())
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            let _ = self.writer.lock().flush();
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
