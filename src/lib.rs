//! # Event Store
//!
//! An in-process server-sent event broadcaster with an ordered replay log.
//!
//! ## Core Concepts
//!
//! - **Events**: Immutable records with a sequence id, optional name, and payload
//! - **Log**: Append-only event history used to replay missed events
//! - **Sinks**: One output channel per connected client
//! - **Broadcaster**: Best-effort fan-out that drops failing sinks
//! - **Reconnects**: Clients resume from their last event id, or are told to retry later
//!
//! ## Example
//!
//! ```ignore
//! use eventstore::{ChannelSink, ItemStore, LastEventId};
//!
//! let store = ItemStore::new();
//!
//! // Attach a client
//! let (sink, receiver) = ChannelSink::new(64);
//! store.item_events(LastEventId::NONE, sink)?;
//!
//! // Add an item; the client receives the item and a "size" event
//! store.add_item("foo");
//! let event = receiver.recv()?;
//!
//! // Later, a reconnecting client catches up from its last id
//! let (sink, receiver) = ChannelSink::new(64);
//! store.item_events(LastEventId(0), sink)?;
//! ```

pub mod broadcast;
pub mod command;
pub mod config;
pub mod error;
pub mod events;
pub mod store;
pub mod types;

// Re-exports
pub use broadcast::{
    BroadcastListener, BroadcastStats, Broadcaster, ChannelSink, EventSink, SinkId, SinkReceiver,
    SinkRegistry, WriterSink,
};
pub use command::Command;
pub use config::{Retention, StoreConfig};
pub use error::{ErrorKind, Result, SinkError, StoreError};
pub use events::{encode_event, write_event, EventDecoder, EventLog, LogReader, LogWriter};
pub use store::{ItemStore, ReplaySummary, SIZE_EVENT};
pub use types::*;
