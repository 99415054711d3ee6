//! Shared helpers for the session integration tests

#![allow(dead_code)]

use rtcssl::identity::{KeyParams, SslFingerprint, SslIdentity, DIGEST_SHA_256};
use rtcssl::stream::{SslMode, SslRole, SslStateKind, SslStreamAdapter};
use rtcssl::transport::memory::{Framing, MemoryTransport};
use rtcssl::transport::{SessionEvent, StreamEvents, StreamResult, StreamState, Transport};
use std::thread;
use std::time::{Duration, Instant};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn identity(name: &str) -> SslIdentity {
    SslIdentity::generate(name, &KeyParams::default(), 3600).unwrap()
}

pub fn fingerprint(identity: &SslIdentity) -> SslFingerprint {
    SslFingerprint::create(DIGEST_SHA_256, identity).unwrap()
}

/// Transport wrapper that silently loses the first `drop_count` writes
pub struct LossyTransport {
    inner: MemoryTransport,
    drop_count: usize,
    pub dropped: usize,
}

impl LossyTransport {
    pub fn new(inner: MemoryTransport, drop_count: usize) -> Self {
        LossyTransport {
            inner,
            drop_count,
            dropped: 0,
        }
    }
}

impl Transport for LossyTransport {
    fn state(&self) -> StreamState {
        self.inner.state()
    }

    fn read(&mut self, buf: &mut [u8]) -> StreamResult {
        self.inner.read(buf)
    }

    fn write(&mut self, data: &[u8]) -> StreamResult {
        if self.dropped < self.drop_count {
            self.dropped += 1;
            return StreamResult::Success(data.len());
        }
        self.inner.write(data)
    }

    fn close(&mut self) {
        self.inner.close()
    }
}

/// Transport wrapper that holds back the first write and sends it after
/// the second
pub struct ReorderingTransport {
    inner: MemoryTransport,
    held: Option<Vec<u8>>,
    writes: usize,
}

impl ReorderingTransport {
    pub fn new(inner: MemoryTransport) -> Self {
        ReorderingTransport {
            inner,
            held: None,
            writes: 0,
        }
    }

    pub fn swapped(&self) -> bool {
        self.writes >= 2 && self.held.is_none()
    }
}

impl Transport for ReorderingTransport {
    fn state(&self) -> StreamState {
        self.inner.state()
    }

    fn read(&mut self, buf: &mut [u8]) -> StreamResult {
        self.inner.read(buf)
    }

    fn write(&mut self, data: &[u8]) -> StreamResult {
        self.writes += 1;
        match self.writes {
            1 => {
                self.held = Some(data.to_vec());
                StreamResult::Success(data.len())
            }
            2 => {
                let result = self.inner.write(data);
                if let Some(first) = self.held.take() {
                    self.inner.write(&first);
                }
                result
            }
            _ => self.inner.write(data),
        }
    }

    fn close(&mut self) {
        self.inner.close()
    }
}

/// Configure a peer-to-peer session pinned to `remote`
pub fn configure_peer<T: Transport + 'static>(
    session: &mut SslStreamAdapter<T>,
    mode: SslMode,
    role: SslRole,
    local: SslIdentity,
    remote: &SslIdentity,
) {
    let fp = fingerprint(remote);
    session.set_mode(mode).unwrap();
    session.set_role(role).unwrap();
    session.set_identity(local).unwrap();
    session
        .set_peer_certificate_digest(&fp.algorithm, &fp.digest)
        .unwrap();
}

/// Client and server sessions over a fresh in-memory pair
pub fn peer_pair(
    mode: SslMode,
) -> (
    SslStreamAdapter<MemoryTransport>,
    SslStreamAdapter<MemoryTransport>,
) {
    let framing = match mode {
        SslMode::Tls => Framing::Stream,
        SslMode::Dtls => Framing::Datagram,
    };
    let (a, b) = MemoryTransport::pair(framing);
    let client_id = identity("client");
    let server_id = identity("server");

    let mut client = SslStreamAdapter::new(a);
    let mut server = SslStreamAdapter::new(b);
    configure_peer(&mut client, mode, SslRole::Client, client_id.clone(), &server_id);
    configure_peer(&mut server, mode, SslRole::Server, server_id, &client_id);
    (client, server)
}

fn drive<T: Transport + 'static>(session: &mut SslStreamAdapter<T>) {
    if session.state() == SslStateKind::Connecting {
        session.on_transport_event(StreamEvents::READ | StreamEvents::WRITE, 0);
    }
    if let Some(deadline) = session.poll_timeout() {
        let now = Instant::now();
        if now >= deadline {
            session.handle_timeout(now);
        }
    }
}

fn settled(state: SslStateKind) -> bool {
    matches!(
        state,
        SslStateKind::Connected | SslStateKind::Error | SslStateKind::Closed
    )
}

/// Step both sessions until each has connected or failed, or `limit` passes
pub fn run_handshake<A: Transport + 'static, B: Transport + 'static>(
    client: &mut SslStreamAdapter<A>,
    server: &mut SslStreamAdapter<B>,
    limit: Duration,
) {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        drive(client);
        drive(server);
        if settled(client.state()) && settled(server.state()) {
            return;
        }
        // A failed side never answers again; give the other side a few
        // more steps to see the alert and stop
        if client.state() == SslStateKind::Error || server.state() == SslStateKind::Error {
            for _ in 0..5 {
                drive(client);
                drive(server);
            }
            return;
        }
        thread::sleep(Duration::from_millis(2));
    }
}

pub fn drain_events<T: Transport + 'static>(session: &mut SslStreamAdapter<T>) -> Vec<SessionEvent> {
    std::iter::from_fn(|| session.poll_event()).collect()
}

pub fn has_event(events: &[SessionEvent], wanted: StreamEvents) -> bool {
    events.iter().any(|event| event.events.contains(wanted))
}

/// Write `data` on one side and read it back on the other
pub fn send_and_receive<A: Transport + 'static, B: Transport + 'static>(
    from: &mut SslStreamAdapter<A>,
    to: &mut SslStreamAdapter<B>,
    data: &[u8],
) -> Vec<u8> {
    assert_eq!(from.write(data), StreamResult::Success(data.len()));
    let mut received = Vec::new();
    let mut buf = [0u8; 4096];
    let deadline = Instant::now() + Duration::from_secs(5);
    while received.len() < data.len() && Instant::now() < deadline {
        match to.read(&mut buf) {
            StreamResult::Success(n) => received.extend_from_slice(&buf[..n]),
            StreamResult::Block => thread::sleep(Duration::from_millis(1)),
            other => panic!("unexpected read result {:?}", other),
        }
    }
    received
}
