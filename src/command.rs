//! Administrative commands controlling the stream.

use crate::error::StoreError;
use std::fmt;
use std::str::FromStr;

const RECONNECT_PREFIX: &str = "reconnect ";

/// A parsed administrative command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Close every connected sink and discard the broadcaster.
    Disconnect,
    /// Set the reconnect delay, in seconds. Zero allows immediate reconnects.
    Reconnect(u64),
}

impl FromStr for Command {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "disconnect" {
            return Ok(Command::Disconnect);
        }

        if let Some(when) = s.strip_prefix(RECONNECT_PREFIX) {
            if when == "now" {
                return Ok(Command::Reconnect(0));
            }
            if let Ok(delay) = when.parse::<u64>() {
                return Ok(Command::Reconnect(delay));
            }
        }

        Err(StoreError::BadCommand(s.to_string()))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Disconnect => write!(f, "disconnect"),
            Command::Reconnect(0) => write!(f, "reconnect now"),
            Command::Reconnect(delay) => write!(f, "reconnect {}", delay),
        }
    }
}
