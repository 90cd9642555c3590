//! Server-sent events wire format.
//!
//! Each event is written as a block of `field: value` lines terminated by a
//! blank line:
//!
//! ```text
//! : optional comment
//! event: size
//! id: 3
//! retry: 500
//! data: first line
//! data: second line
//!
//! ```
//!
//! `\r\n`, `\r` and `\n` all terminate a line. Line breaks inside a
//! payload or comment become separate `data:`/`:` lines and decode as `\n`.

use crate::types::{Event, EventId};
use std::io::{self, Write};
use std::time::Duration;

/// Encode a single event.
pub fn encode_event(event: &Event) -> Vec<u8> {
    let mut out = Vec::with_capacity(event.data.len() + 32);
    // Writing into a Vec cannot fail.
    let _ = write_event(&mut out, event);
    out
}

/// Write a single event to `writer`. Does not flush.
pub fn write_event<W: Write + ?Sized>(writer: &mut W, event: &Event) -> io::Result<()> {
    if let Some(ref comment) = event.comment {
        for line in split_lines(comment) {
            writer.write_all(b": ")?;
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        }
    }

    if let Some(ref name) = event.name {
        let name: String = name.chars().filter(|c| !is_line_break(*c)).collect();
        writeln!(writer, "event: {}", name)?;
    }

    if let Some(id) = event.id {
        writeln!(writer, "id: {}", id)?;
    }

    if let Some(retry) = event.retry {
        writeln!(writer, "retry: {}", retry.as_millis())?;
    }

    let data = event.data_str();
    for line in split_lines(&data) {
        writer.write_all(b"data: ")?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
    }

    writer.write_all(b"\n")
}

fn is_line_break(c: char) -> bool {
    c == '\r' || c == '\n'
}

fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split("\r\n").flat_map(|part| part.split(is_line_break))
}

/// Incremental decoder for the event stream.
///
/// Bytes may arrive in arbitrary chunks; an event is emitted once its
/// terminating blank line has been seen.
#[derive(Default)]
pub struct EventDecoder {
    buffer: Vec<u8>,
    pending: PendingEvent,
    /// Last line ended in `\r`; a following `\n` belongs to it.
    after_cr: bool,
}

#[derive(Default)]
struct PendingEvent {
    id: Option<EventId>,
    name: Option<String>,
    data: Option<String>,
    comment: Option<String>,
    retry: Option<Duration>,
}

impl PendingEvent {
    fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.name.is_none()
            && self.data.is_none()
            && self.comment.is_none()
            && self.retry.is_none()
    }

    fn take(&mut self) -> Event {
        let pending = std::mem::take(self);
        Event {
            id: pending.id,
            name: pending.name,
            data: pending.data.unwrap_or_default().into_bytes(),
            comment: pending.comment,
            retry: pending.retry,
        }
    }
}

impl EventDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes, returning every event it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Event> {
        let mut events = Vec::new();
        for &byte in chunk {
            if std::mem::take(&mut self.after_cr) && byte == b'\n' {
                continue;
            }
            match byte {
                b'\r' | b'\n' => {
                    self.after_cr = byte == b'\r';
                    self.end_line(&mut events);
                }
                _ => self.buffer.push(byte),
            }
        }
        events
    }

    fn end_line(&mut self, events: &mut Vec<Event>) {
        let raw = std::mem::take(&mut self.buffer);
        let line = String::from_utf8_lossy(&raw);

        if line.is_empty() {
            if !self.pending.is_empty() {
                events.push(self.pending.take());
            }
            return;
        }

        self.process_line(&line);
    }

    fn process_line(&mut self, line: &str) {
        let (field, value) = match line.find(':') {
            Some(0) => {
                let comment = strip_space(&line[1..]);
                append_line(&mut self.pending.comment, comment);
                return;
            }
            Some(idx) => (&line[..idx], strip_space(&line[idx + 1..])),
            None => (line, ""),
        };

        match field {
            "data" => append_line(&mut self.pending.data, value),
            "event" => self.pending.name = Some(value.to_string()),
            "id" => {
                if let Ok(id) = value.parse::<u64>() {
                    self.pending.id = Some(EventId(id));
                }
            }
            "retry" => {
                if let Ok(ms) = value.parse::<u64>() {
                    self.pending.retry = Some(Duration::from_millis(ms));
                }
            }
            other => tracing::debug!(field = other, "Ignoring unknown event field"),
        }
    }
}

fn strip_space(value: &str) -> &str {
    value.strip_prefix(' ').unwrap_or(value)
}

fn append_line(target: &mut Option<String>, line: &str) {
    match target {
        Some(existing) => {
            existing.push('\n');
            existing.push_str(line);
        }
        None => *target = Some(line.to_string()),
    }
}
