//! Transport abstraction
//!
//! A secure session never touches sockets directly. It reads and writes
//! through a [`Transport`] and is told about readiness changes through
//! [`StreamEvents`]. The same trait covers byte streams (TCP, in-memory
//! FIFO) and packet transports (UDP, in-memory datagram queue); for packet
//! transports every `write` is one datagram and every `read` returns at
//! most one.

pub mod memory;
pub mod socket;

use std::ops::{BitOr, BitOrAssign};

/// Outcome of a single non-blocking read or write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamResult {
    /// Bytes transferred
    Success(usize),
    /// Nothing could be transferred right now; retry on the next event
    Block,
    /// The peer closed the stream
    Eos,
    /// Transport failure with an implementation-defined code
    Error(i32),
}

/// Coarse transport state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Closed,
    Opening,
    Open,
}

/// Non-blocking byte or packet transport
pub trait Transport {
    fn state(&self) -> StreamState;

    fn read(&mut self, buf: &mut [u8]) -> StreamResult;

    fn write(&mut self, data: &[u8]) -> StreamResult;

    fn close(&mut self);
}

/// Readiness bitmask delivered with transport and session notifications
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StreamEvents(u8);

impl StreamEvents {
    /// The stream finished opening
    pub const OPEN: StreamEvents = StreamEvents(0x1);
    /// Data can be read
    pub const READ: StreamEvents = StreamEvents(0x2);
    /// Data can be written
    pub const WRITE: StreamEvents = StreamEvents(0x4);
    /// The stream closed; accompanied by an error code
    pub const CLOSE: StreamEvents = StreamEvents(0x8);

    pub fn empty() -> Self {
        StreamEvents(0)
    }

    pub fn from_u8(bits: u8) -> Self {
        StreamEvents(bits & 0xf)
    }

    pub fn as_u8(&self) -> u8 {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// True if any bit of `other` is set
    pub fn contains(&self, other: StreamEvents) -> bool {
        (self.0 & other.0) != 0
    }

    pub fn insert(&mut self, other: StreamEvents) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: StreamEvents) {
        self.0 &= !other.0;
    }
}

impl BitOr for StreamEvents {
    type Output = StreamEvents;

    fn bitor(self, rhs: StreamEvents) -> StreamEvents {
        StreamEvents(self.0 | rhs.0)
    }
}

impl BitOrAssign for StreamEvents {
    fn bitor_assign(&mut self, rhs: StreamEvents) {
        self.0 |= rhs.0;
    }
}

/// Notification raised by a session towards its owner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionEvent {
    pub events: StreamEvents,
    /// Error code; meaningful with [`StreamEvents::CLOSE`]
    pub error: i32,
}
