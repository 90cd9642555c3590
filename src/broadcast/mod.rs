//! Live delivery of events to connected clients.
//!
//! - [`EventSink`] is the per-client output channel, implemented per
//!   transport: [`ChannelSink`] for non-blocking delivery through a bounded
//!   buffer, [`WriterSink`] for a thread blocked on a stream.
//! - [`SinkRegistry`] holds the attached sinks.
//! - [`Broadcaster`] fans each event out, dropping sinks that fail.
//!
//! # Example
//!
//! ```ignore
//! let broadcaster = Broadcaster::new();
//! let (sink, receiver) = ChannelSink::new(16);
//! broadcaster.register(sink);
//!
//! broadcaster.broadcast(&Event::text("hello"));
//! assert_eq!(receiver.recv()?.data_str(), "hello");
//! ```

mod broadcaster;
mod registry;
mod sink;

pub use broadcaster::{BroadcastListener, BroadcastStats, Broadcaster};
pub use registry::SinkRegistry;
pub use sink::{ChannelSink, EventSink, SinkId, SinkReceiver, WriterSink};
