//! Core types for the event store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;
use std::time::Duration;

/// Position of an event in the log, assigned at append time.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct EventId(pub u64);

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventId({})", self.0)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The replay cursor a client reports when it (re)connects.
///
/// Negative values mean the client has never seen an event.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LastEventId(pub i64);

impl LastEventId {
    /// Cursor of a fresh client.
    pub const NONE: LastEventId = LastEventId(-1);

    /// Cursor pointing at a specific event.
    pub fn at(id: EventId) -> Self {
        LastEventId(id.0 as i64)
    }

    /// Whether this cursor comes from a reconnecting client.
    pub fn is_reconnect(&self) -> bool {
        self.0 >= 0
    }

    /// First event id the client has not received.
    pub fn first_missing(&self) -> EventId {
        if self.0 < 0 {
            EventId(0)
        } else {
            EventId(self.0 as u64 + 1)
        }
    }
}

impl Default for LastEventId {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Debug for LastEventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LastEventId({})", self.0)
    }
}

impl FromStr for LastEventId {
    type Err = ParseIntError;

    /// Parses header text. Blank text is treated as an absent header.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::NONE);
        }
        s.parse::<i64>().map(LastEventId)
    }
}

/// A single server-pushed event.
///
/// Item events carry an `id`; informational events such as the `size`
/// notification carry only a name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: Option<EventId>,
    pub name: Option<String>,
    pub data: Vec<u8>,
    pub comment: Option<String>,
    /// Reconnection hint sent to the client.
    pub retry: Option<Duration>,
}

impl Event {
    /// Create an unnamed event with a text payload.
    pub fn text(data: impl Into<String>) -> Self {
        Self::raw(data.into().into_bytes())
    }

    /// Create an unnamed event with raw bytes.
    pub fn raw(data: Vec<u8>) -> Self {
        Self {
            id: None,
            name: None,
            data,
            comment: None,
            retry: None,
        }
    }

    /// Create a named event with a JSON payload.
    pub fn json(name: impl Into<String>, payload: &impl Serialize) -> Result<Self, serde_json::Error> {
        Ok(Self::raw(serde_json::to_vec(payload)?).with_name(name))
    }

    pub fn with_id(mut self, id: EventId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_retry(mut self, retry: Duration) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Payload as UTF-8, replacing invalid sequences.
    pub fn data_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }
}
