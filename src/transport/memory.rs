//! In-memory transport pair
//!
//! Two connected endpoints sharing one buffer per direction. Stream framing
//! behaves like a bounded byte FIFO; datagram framing keeps packet
//! boundaries and truncates packets that do not fit the read buffer.

use super::{StreamResult, StreamState, Transport};
use bytes::{Buf, Bytes, BytesMut};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Default capacity of a stream-framed direction in bytes
pub const DEFAULT_STREAM_CAPACITY: usize = 64 * 1024;
/// Default capacity of a datagram-framed direction in packets
pub const DEFAULT_DATAGRAM_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    Stream,
    Datagram,
}

#[derive(Debug)]
enum Pipe {
    Stream { buf: BytesMut, capacity: usize },
    Datagram { queue: VecDeque<Bytes>, capacity: usize },
}

impl Pipe {
    fn new(framing: Framing) -> Self {
        match framing {
            Framing::Stream => Pipe::Stream {
                buf: BytesMut::with_capacity(DEFAULT_STREAM_CAPACITY),
                capacity: DEFAULT_STREAM_CAPACITY,
            },
            Framing::Datagram => Pipe::Datagram {
                queue: VecDeque::new(),
                capacity: DEFAULT_DATAGRAM_CAPACITY,
            },
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Pipe::Stream { buf, .. } => buf.is_empty(),
            Pipe::Datagram { queue, .. } => queue.is_empty(),
        }
    }

    fn push(&mut self, data: &[u8]) -> StreamResult {
        match self {
            Pipe::Stream { buf, capacity } => {
                let room = capacity.saturating_sub(buf.len());
                if room == 0 {
                    return StreamResult::Block;
                }
                let n = room.min(data.len());
                buf.extend_from_slice(&data[..n]);
                StreamResult::Success(n)
            }
            Pipe::Datagram { queue, capacity } => {
                if queue.len() >= *capacity {
                    return StreamResult::Block;
                }
                queue.push_back(Bytes::copy_from_slice(data));
                StreamResult::Success(data.len())
            }
        }
    }

    fn pop(&mut self, out: &mut [u8]) -> Option<usize> {
        match self {
            Pipe::Stream { buf, .. } => {
                if buf.is_empty() {
                    return None;
                }
                let n = out.len().min(buf.len());
                out[..n].copy_from_slice(&buf[..n]);
                buf.advance(n);
                Some(n)
            }
            Pipe::Datagram { queue, .. } => {
                let packet = queue.pop_front()?;
                let n = out.len().min(packet.len());
                out[..n].copy_from_slice(&packet[..n]);
                Some(n)
            }
        }
    }
}

#[derive(Debug)]
struct Link {
    state: StreamState,
    // pipes[i] carries data towards side i
    pipes: [Pipe; 2],
}

/// One end of an in-memory transport pair
#[derive(Debug)]
pub struct MemoryTransport {
    link: Arc<Mutex<Link>>,
    side: usize,
}

impl MemoryTransport {
    /// Create a connected pair that is already open
    pub fn pair(framing: Framing) -> (MemoryTransport, MemoryTransport) {
        Self::pair_with_state(framing, StreamState::Open)
    }

    /// Create a pair that stays in `Opening` until [`MemoryTransport::set_open`]
    pub fn pair_opening(framing: Framing) -> (MemoryTransport, MemoryTransport) {
        Self::pair_with_state(framing, StreamState::Opening)
    }

    fn pair_with_state(framing: Framing, state: StreamState) -> (MemoryTransport, MemoryTransport) {
        let link = Arc::new(Mutex::new(Link {
            state,
            pipes: [Pipe::new(framing), Pipe::new(framing)],
        }));
        (
            MemoryTransport {
                link: link.clone(),
                side: 0,
            },
            MemoryTransport { link, side: 1 },
        )
    }

    /// Move both ends of an opening pair to `Open`
    pub fn set_open(&self) {
        let mut link = self.link.lock();
        if link.state == StreamState::Opening {
            link.state = StreamState::Open;
        }
    }

    /// Data (or end of stream) is waiting to be read on this end
    pub fn readable(&self) -> bool {
        let link = self.link.lock();
        !link.pipes[self.side].is_empty() || link.state == StreamState::Closed
    }
}

impl Transport for MemoryTransport {
    fn state(&self) -> StreamState {
        self.link.lock().state
    }

    fn read(&mut self, buf: &mut [u8]) -> StreamResult {
        let mut link = self.link.lock();
        if let Some(n) = link.pipes[self.side].pop(buf) {
            return StreamResult::Success(n);
        }
        match link.state {
            StreamState::Closed => StreamResult::Eos,
            _ => StreamResult::Block,
        }
    }

    fn write(&mut self, data: &[u8]) -> StreamResult {
        let mut link = self.link.lock();
        match link.state {
            StreamState::Open => link.pipes[1 - self.side].push(data),
            StreamState::Opening => StreamResult::Block,
            StreamState::Closed => StreamResult::Error(libc::EPIPE),
        }
    }

    fn close(&mut self) {
        self.link.lock().state = StreamState::Closed;
    }
}
