//! Non-blocking OS socket transport
//!
//! Wraps a `socket2` TCP or UDP socket and reports readiness through
//! `libc::poll`. A UDP transport is connected to a single peer so that
//! plain `read`/`write` carry whole datagrams.

use super::{SessionEvent, StreamEvents, StreamResult, StreamState, Transport};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::os::fd::AsRawFd;
use std::time::Duration;
use tracing::debug;

#[derive(Debug)]
pub struct SocketTransport {
    socket: Socket,
    state: StreamState,
    datagram: bool,
}

fn error_code(err: &io::Error) -> i32 {
    err.raw_os_error().unwrap_or(-1)
}

impl SocketTransport {
    /// Start a non-blocking TCP connect; the transport stays `Opening`
    /// until [`SocketTransport::poll`] reports [`StreamEvents::OPEN`]
    pub fn connect_tcp(addr: SocketAddr) -> io::Result<Self> {
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
        socket.set_nonblocking(true)?;
        socket.set_nodelay(true)?;

        let state = match socket.connect(&SockAddr::from(addr)) {
            Ok(()) => StreamState::Open,
            Err(e)
                if e.raw_os_error() == Some(libc::EINPROGRESS)
                    || e.kind() == io::ErrorKind::WouldBlock =>
            {
                StreamState::Opening
            }
            Err(e) => return Err(e),
        };
        debug!("TCP connect to {} started, state {:?}", addr, state);

        Ok(SocketTransport {
            socket,
            state,
            datagram: false,
        })
    }

    /// Wrap an already connected TCP stream (e.g. from `accept`)
    pub fn from_tcp_stream(stream: TcpStream) -> io::Result<Self> {
        let socket = Socket::from(stream);
        socket.set_nonblocking(true)?;
        socket.set_nodelay(true)?;
        Ok(SocketTransport {
            socket,
            state: StreamState::Open,
            datagram: false,
        })
    }

    /// UDP socket bound to `local` and connected to `peer`
    pub fn udp(local: SocketAddr, peer: SocketAddr) -> io::Result<Self> {
        let socket = Self::udp_bound(local)?;
        Self::udp_connect(socket, peer)
    }

    /// Bind a UDP socket without choosing a peer yet, so that both ends of
    /// a test can learn each other's ephemeral ports first
    pub fn udp_bound(local: SocketAddr) -> io::Result<Socket> {
        let socket = Socket::new(Domain::for_address(local), Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_nonblocking(true)?;
        socket.bind(&SockAddr::from(local))?;
        Ok(socket)
    }

    /// Connect a socket from [`SocketTransport::udp_bound`] to its peer
    pub fn udp_connect(socket: Socket, peer: SocketAddr) -> io::Result<Self> {
        socket.connect(&SockAddr::from(peer))?;
        Ok(SocketTransport {
            socket,
            state: StreamState::Open,
            datagram: true,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket
            .local_addr()?
            .as_socket()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "not an IP socket"))
    }

    /// Wait for readiness.
    ///
    /// While opening, only connect completion is watched and reported as
    /// OPEN (or CLOSE with the connect error). Afterwards READ and WRITE are
    /// reported as requested by `interest`.
    pub fn poll(
        &mut self,
        interest: StreamEvents,
        timeout: Option<Duration>,
    ) -> io::Result<SessionEvent> {
        use libc::{poll, pollfd, POLLERR, POLLHUP, POLLIN, POLLOUT};

        let mut event = SessionEvent {
            events: StreamEvents::empty(),
            error: 0,
        };
        if self.state == StreamState::Closed {
            return Ok(event);
        }

        let mut pfd = pollfd {
            fd: self.socket.as_raw_fd(),
            events: 0,
            revents: 0,
        };
        if self.state == StreamState::Opening {
            pfd.events = POLLOUT;
        } else {
            if interest.contains(StreamEvents::READ) {
                pfd.events |= POLLIN;
            }
            if interest.contains(StreamEvents::WRITE) {
                pfd.events |= POLLOUT;
            }
        }

        let timeout_ms = timeout.map(|d| d.as_millis() as i32).unwrap_or(-1);

        let result = unsafe { poll(&mut pfd as *mut pollfd, 1, timeout_ms) };
        if result < 0 {
            return Err(io::Error::last_os_error());
        }
        if result == 0 {
            return Ok(event);
        }

        if pfd.revents & POLLERR != 0 {
            let code = match self.socket.take_error()? {
                Some(err) => error_code(&err),
                None => -1,
            };
            self.state = StreamState::Closed;
            event.events = StreamEvents::CLOSE;
            event.error = code;
            return Ok(event);
        }

        if self.state == StreamState::Opening {
            if pfd.revents & (POLLOUT | POLLHUP) != 0 {
                if let Some(err) = self.socket.take_error()? {
                    self.state = StreamState::Closed;
                    event.events = StreamEvents::CLOSE;
                    event.error = error_code(&err);
                    return Ok(event);
                }
                self.state = StreamState::Open;
                event.events = StreamEvents::OPEN;
            }
            return Ok(event);
        }

        if pfd.revents & (POLLIN | POLLHUP) != 0 {
            event.events |= StreamEvents::READ;
        }
        if pfd.revents & POLLOUT != 0 {
            event.events |= StreamEvents::WRITE;
        }
        Ok(event)
    }
}

impl Transport for SocketTransport {
    fn state(&self) -> StreamState {
        self.state
    }

    fn read(&mut self, buf: &mut [u8]) -> StreamResult {
        if self.state == StreamState::Opening {
            return StreamResult::Block;
        }
        match self.socket.read(buf) {
            Ok(0) if !self.datagram => {
                self.state = StreamState::Closed;
                StreamResult::Eos
            }
            Ok(n) => StreamResult::Success(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => StreamResult::Block,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => StreamResult::Block,
            Err(e) => StreamResult::Error(error_code(&e)),
        }
    }

    fn write(&mut self, data: &[u8]) -> StreamResult {
        match self.state {
            StreamState::Opening => return StreamResult::Block,
            StreamState::Closed => return StreamResult::Error(libc::EPIPE),
            StreamState::Open => {}
        }
        match self.socket.write(data) {
            Ok(n) => StreamResult::Success(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => StreamResult::Block,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => StreamResult::Block,
            Err(e) => StreamResult::Error(error_code(&e)),
        }
    }

    fn close(&mut self) {
        if self.state != StreamState::Closed {
            if !self.datagram {
                let _ = self.socket.shutdown(std::net::Shutdown::Both);
            }
            self.state = StreamState::Closed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn poll_until(transport: &mut SocketTransport, wanted: StreamEvents) -> SessionEvent {
        for _ in 0..100 {
            let event = transport
                .poll(wanted, Some(Duration::from_millis(50)))
                .unwrap();
            if event.events.contains(wanted) {
                return event;
            }
        }
        panic!("no {:?} event", wanted);
    }

    #[test]
    fn test_tcp_connect_and_transfer() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mut client = SocketTransport::connect_tcp(addr).unwrap();
        let (accepted, _) = listener.accept().unwrap();
        let mut server = SocketTransport::from_tcp_stream(accepted).unwrap();

        if client.state() == StreamState::Opening {
            poll_until(&mut client, StreamEvents::OPEN);
        }
        assert_eq!(client.state(), StreamState::Open);

        assert_eq!(client.write(b"ping"), StreamResult::Success(4));
        poll_until(&mut server, StreamEvents::READ);
        let mut buf = [0u8; 16];
        assert_eq!(server.read(&mut buf), StreamResult::Success(4));
        assert_eq!(&buf[..4], b"ping");
        assert_eq!(server.read(&mut buf), StreamResult::Block);

        client.close();
        poll_until(&mut server, StreamEvents::READ);
        assert_eq!(server.read(&mut buf), StreamResult::Eos);
        assert_eq!(server.state(), StreamState::Closed);
    }

    #[test]
    fn test_udp_datagrams() {
        let any: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let a = SocketTransport::udp_bound(any).unwrap();
        let b = SocketTransport::udp_bound(any).unwrap();
        let a_addr = a.local_addr().unwrap().as_socket().unwrap();
        let b_addr = b.local_addr().unwrap().as_socket().unwrap();

        let mut a = SocketTransport::udp_connect(a, b_addr).unwrap();
        let mut b = SocketTransport::udp_connect(b, a_addr).unwrap();

        assert_eq!(a.write(b"one"), StreamResult::Success(3));
        assert_eq!(a.write(b"two!"), StreamResult::Success(4));
        poll_until(&mut b, StreamEvents::READ);

        let mut buf = [0u8; 16];
        assert_eq!(b.read(&mut buf), StreamResult::Success(3));
        poll_until(&mut b, StreamEvents::READ);
        assert_eq!(b.read(&mut buf), StreamResult::Success(4));
        assert_eq!(&buf[..4], b"two!");
    }
}
