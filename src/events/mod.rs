//! Event log and wire format.
//!
//! Events are kept in an in-memory, append-only log so that reconnecting
//! clients can be replayed what they missed.

mod codec;
mod log;

pub use codec::{encode_event, write_event, EventDecoder};
pub use log::{EventLog, LogReader, LogWriter};
