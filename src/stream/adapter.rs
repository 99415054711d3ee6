//! TLS/DTLS session state machine
//!
//! [`SslStreamAdapter`] wraps a [`Transport`] and runs an OpenSSL handshake
//! over it without ever blocking. The owner feeds transport readiness in
//! through [`SslStreamAdapter::on_transport_event`], drains notifications
//! with [`SslStreamAdapter::poll_event`], and in DTLS mode services the
//! retransmission timer through [`SslStreamAdapter::poll_timeout`] and
//! [`SslStreamAdapter::handle_timeout`].
//!
//! ```text
//! None -> Wait -> Connecting -> Connected -> Closed
//!          \__________\______________\_____> Error
//! ```
//!
//! Before a handshake is started the adapter is transparent: reads and
//! writes go straight to the transport.

use super::bio::{transport_code, TransportIo};
use super::cipher::DEFAULT_CIPHER_LIST;
use super::config::{SslMode, SslProtocolVersion, SslRole};
use super::info::{negotiated_srtp_suite, ConnectionInfo};
use super::srtp::{srtp_profile_list, SrtpCryptoSuite};
use super::timer::{dtls_get_timeout, dtls_handle_timeout, RetransmitTimer};
use super::verify::{matches_host, CertificateVerifier, VerifyOutcome, VerifyPolicy};
use crate::error::{Result, SslError};
use crate::identity::digest::digest_size;
use crate::identity::{CertInfo, SslCertChain, SslCertificate, SslIdentity};
use crate::transport::{SessionEvent, StreamEvents, StreamResult, StreamState, Transport};
use openssl::ssl::{
    ErrorCode, HandshakeError, MidHandshakeSslStream, Ssl, SslContext, SslContextBuilder,
    SslMethod, SslOptions, SslRef, SslStream, SslStreamBuilder, SslVerifyMode,
};
use openssl::x509::X509VerifyResult;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::mem;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Error code reported when a DTLS record did not fit the read buffer
pub const SSE_MSG_TRUNC: i32 = 0xff0001;

/// Default DTLS path MTU
pub const DEFAULT_DTLS_MTU: u32 = 1200;

const VERIFY_DEPTH: u32 = 4;

/// Observable session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SslStateKind {
    /// No handshake requested; I/O passes through
    None,
    /// Handshake requested, waiting for the transport to open
    Wait,
    Connecting,
    Connected,
    Error,
    Closed,
}

enum SslState<T> {
    None,
    Wait,
    Connecting(MidHandshakeSslStream<TransportIo<T>>),
    Connected(SslStream<TransportIo<T>>),
    Error(i32),
    Closed,
}

impl<T> SslState<T> {
    fn kind(&self) -> SslStateKind {
        match self {
            SslState::None => SslStateKind::None,
            SslState::Wait => SslStateKind::Wait,
            SslState::Connecting(_) => SslStateKind::Connecting,
            SslState::Connected(_) => SslStateKind::Connected,
            SslState::Error(_) => SslStateKind::Error,
            SslState::Closed => SslStateKind::Closed,
        }
    }
}

/// Secure session over a non-blocking transport
pub struct SslStreamAdapter<T: Transport + 'static> {
    transport: Arc<Mutex<T>>,
    state: SslState<T>,

    role: SslRole,
    mode: SslMode,
    max_version: SslProtocolVersion,
    identity: Option<SslIdentity>,
    server_name: Option<String>,
    peer_digest: Option<(String, Vec<u8>)>,
    srtp_suites: Vec<SrtpCryptoSuite>,
    client_auth_enabled: bool,
    ignore_bad_cert: bool,
    verifier: Option<Arc<dyn CertificateVerifier>>,
    trusted_roots: Vec<SslCertificate>,
    use_system_roots: bool,
    restartable: bool,
    dtls_mtu: u32,

    outcome: Arc<Mutex<VerifyOutcome>>,
    peer_certificate: Option<SslCertificate>,
    timer: RetransmitTimer,
    read_needs_write: bool,
    write_needs_read: bool,
    events: VecDeque<SessionEvent>,
}

impl<T: Transport + 'static> SslStreamAdapter<T> {
    /// Wrap `transport`; the session starts in `None` and passes I/O through
    pub fn new(transport: T) -> Self {
        Self::from_shared(Arc::new(Mutex::new(transport)))
    }

    /// Wrap a transport the caller keeps a handle to
    pub fn from_shared(transport: Arc<Mutex<T>>) -> Self {
        SslStreamAdapter {
            transport,
            state: SslState::None,
            role: SslRole::Client,
            mode: SslMode::Tls,
            max_version: SslProtocolVersion::default(),
            identity: None,
            server_name: None,
            peer_digest: None,
            srtp_suites: Vec::new(),
            client_auth_enabled: true,
            ignore_bad_cert: false,
            verifier: None,
            trusted_roots: Vec::new(),
            use_system_roots: false,
            restartable: false,
            dtls_mtu: DEFAULT_DTLS_MTU,
            outcome: Arc::default(),
            peer_certificate: None,
            timer: RetransmitTimer::default(),
            read_needs_write: false,
            write_needs_read: false,
            events: VecDeque::new(),
        }
    }

    /// Shared handle to the underlying transport
    pub fn transport(&self) -> &Arc<Mutex<T>> {
        &self.transport
    }

    /// Current session state
    pub fn state(&self) -> SslStateKind {
        self.state.kind()
    }

    /// Stream-level view of the session state
    pub fn stream_state(&self) -> StreamState {
        match self.state {
            SslState::None => self.transport.lock().state(),
            SslState::Wait | SslState::Connecting(_) => StreamState::Opening,
            SslState::Connected(_) => StreamState::Open,
            SslState::Error(_) | SslState::Closed => StreamState::Closed,
        }
    }

    fn require_unstarted(&self, operation: &'static str) -> Result<()> {
        match self.state {
            SslState::None => Ok(()),
            _ => Err(SslError::InvalidState {
                operation,
                state: self.state.kind(),
            }),
        }
    }

    // Configuration

    /// Set the local identity. Allowed once.
    pub fn set_identity(&mut self, identity: SslIdentity) -> Result<()> {
        self.require_unstarted("set_identity")?;
        if self.identity.is_some() {
            return Err(SslError::Configuration("identity already set".to_string()));
        }
        self.identity = Some(identity);
        Ok(())
    }

    /// Handshake as client or server. Defaults to client.
    pub fn set_role(&mut self, role: SslRole) -> Result<()> {
        self.require_unstarted("set_role")?;
        self.role = role;
        Ok(())
    }

    /// TLS over a stream or DTLS over datagrams. Defaults to TLS.
    pub fn set_mode(&mut self, mode: SslMode) -> Result<()> {
        self.require_unstarted("set_mode")?;
        self.mode = mode;
        Ok(())
    }

    /// Highest version offered or accepted; the peer may negotiate lower
    pub fn set_max_protocol_version(&mut self, version: SslProtocolVersion) -> Result<()> {
        self.require_unstarted("set_max_protocol_version")?;
        self.max_version = version;
        Ok(())
    }

    /// Offer these SRTP profiles, most preferred first
    pub fn set_dtls_srtp_crypto_suites(&mut self, suites: &[SrtpCryptoSuite]) -> Result<()> {
        self.require_unstarted("set_dtls_srtp_crypto_suites")?;
        self.srtp_suites = suites.to_vec();
        Ok(())
    }

    /// Like [`Self::set_dtls_srtp_crypto_suites`], from SDP suite names
    pub fn set_dtls_srtp_crypto_suite_names(&mut self, names: &[&str]) -> Result<()> {
        let suites = names
            .iter()
            .map(|name| SrtpCryptoSuite::from_name(name))
            .collect::<Result<Vec<_>>>()?;
        self.set_dtls_srtp_crypto_suites(&suites)
    }

    /// Pin the peer's certificate digest (peer-to-peer mode)
    pub fn set_peer_certificate_digest(&mut self, algorithm: &str, digest: &[u8]) -> Result<()> {
        self.require_unstarted("set_peer_certificate_digest")?;
        if self.peer_digest.is_some() {
            return Err(SslError::Configuration(
                "peer certificate digest already set".to_string(),
            ));
        }
        let expected = digest_size(algorithm)
            .ok_or_else(|| SslError::UnsupportedAlgorithm(algorithm.to_string()))?;
        if digest.len() != expected {
            return Err(SslError::MalformedInput(format!(
                "{} digest must be {} bytes, got {}",
                algorithm,
                expected,
                digest.len()
            )));
        }
        self.peer_digest = Some((algorithm.to_string(), digest.to_vec()));
        Ok(())
    }

    /// Server role: fail the handshake if the client sends no certificate
    pub fn set_client_auth_enabled(&mut self, enabled: bool) -> Result<()> {
        self.require_unstarted("set_client_auth_enabled")?;
        self.client_auth_enabled = enabled;
        Ok(())
    }

    /// Accept the peer whatever the verification outcome. Testing only.
    pub fn set_ignore_bad_cert(&mut self, ignore: bool) -> Result<()> {
        self.require_unstarted("set_ignore_bad_cert")?;
        if ignore {
            warn!("Certificate verification errors will be ignored");
        }
        self.ignore_bad_cert = ignore;
        Ok(())
    }

    /// Custom check run on the leaf when chain validation fails.
    ///
    /// Only consulted in traditional mode; the host name check still applies.
    pub fn set_verifier(&mut self, verifier: Arc<dyn CertificateVerifier>) -> Result<()> {
        self.require_unstarted("set_verifier")?;
        self.verifier = Some(verifier);
        Ok(())
    }

    /// Trust `root` when validating the server chain
    pub fn add_trusted_root(&mut self, root: SslCertificate) -> Result<()> {
        self.require_unstarted("add_trusted_root")?;
        self.trusted_roots.push(root);
        Ok(())
    }

    /// Also trust the system certificate store
    pub fn use_system_roots(&mut self, enabled: bool) -> Result<()> {
        self.require_unstarted("use_system_roots")?;
        self.use_system_roots = enabled;
        Ok(())
    }

    /// Return to `Wait` instead of `Closed` when the transport goes away
    pub fn set_restartable(&mut self, restartable: bool) -> Result<()> {
        self.require_unstarted("set_restartable")?;
        self.restartable = restartable;
        Ok(())
    }

    /// Largest datagram the DTLS record layer will emit
    pub fn set_dtls_mtu(&mut self, mtu: u32) -> Result<()> {
        self.require_unstarted("set_dtls_mtu")?;
        self.dtls_mtu = mtu;
        Ok(())
    }

    // Handshake start

    /// Start a traditional handshake, validating the server as `server_name`
    pub fn start_with_server(&mut self, server_name: &str) -> Result<()> {
        self.require_unstarted("start_with_server")?;
        if self.peer_digest.is_some() {
            return Err(SslError::Configuration(
                "server name and peer digest are mutually exclusive".to_string(),
            ));
        }
        self.server_name = Some(server_name.to_string());
        self.start_ssl()
    }

    /// Start a peer-to-peer handshake authenticated by the pinned digest
    pub fn start_with_peer(&mut self) -> Result<()> {
        self.require_unstarted("start_with_peer")?;
        if self.identity.is_none() {
            return Err(SslError::Configuration(
                "peer-to-peer mode requires an identity".to_string(),
            ));
        }
        if self.peer_digest.is_none() {
            return Err(SslError::Configuration(
                "peer-to-peer mode requires a peer certificate digest".to_string(),
            ));
        }
        self.start_ssl()
    }

    fn start_ssl(&mut self) -> Result<()> {
        if self.transport.lock().state() != StreamState::Open {
            debug!(role = self.role.as_str(), "Transport not open, waiting");
            self.state = SslState::Wait;
            return Ok(());
        }

        if let Err(e) = self.begin_ssl() {
            self.error("begin_ssl", &e, false);
            return Err(e);
        }
        Ok(())
    }

    fn build_context(&self) -> Result<SslContext> {
        let method = match self.mode {
            SslMode::Tls => SslMethod::tls(),
            SslMode::Dtls => SslMethod::dtls(),
        };
        let mut ctx = SslContextBuilder::new(method)?;
        ctx.set_min_proto_version(Some(
            SslProtocolVersion::Tls10.to_openssl_version(self.mode),
        ))?;
        ctx.set_max_proto_version(Some(self.max_version.to_openssl_version(self.mode)))?;
        // TLS 1.0/1.1 and DTLS 1.0 sign with SHA-1, refused above level 0
        ctx.set_security_level(0);
        if self.mode == SslMode::Dtls {
            // The record size comes from set_dtls_mtu, not the transport
            ctx.set_options(SslOptions::NO_QUERY_MTU);
        }
        ctx.set_mode(
            openssl::ssl::SslMode::ENABLE_PARTIAL_WRITE
                | openssl::ssl::SslMode::ACCEPT_MOVING_WRITE_BUFFER,
        );

        if let Some(identity) = &self.identity {
            ctx.set_certificate(identity.certificate().x509())?;
            ctx.set_private_key(identity.key_pair())?;
            ctx.check_private_key()?;
        }

        let mut verify_mode = SslVerifyMode::PEER;
        if self.role == SslRole::Server && self.client_auth_enabled {
            verify_mode |= SslVerifyMode::FAIL_IF_NO_PEER_CERT;
        }
        let policy = VerifyPolicy {
            peer_digest: self.peer_digest.clone(),
            verifier: self.verifier.clone(),
            ignore_bad_cert: self.ignore_bad_cert,
            outcome: self.outcome.clone(),
        };
        ctx.set_verify_callback(verify_mode, move |ok, store| policy.verify(ok, store));
        ctx.set_verify_depth(VERIFY_DEPTH);
        ctx.set_cipher_list(DEFAULT_CIPHER_LIST)?;

        if !self.srtp_suites.is_empty() {
            ctx.set_tlsext_use_srtp(&srtp_profile_list(&self.srtp_suites))?;
        }

        if self.server_name.is_some() {
            for root in &self.trusted_roots {
                ctx.cert_store_mut().add_cert(root.x509().to_owned())?;
            }
            if self.use_system_roots {
                ctx.set_default_verify_paths()?;
            }
        }

        Ok(ctx.build())
    }

    fn begin_ssl(&mut self) -> Result<()> {
        info!(
            role = self.role.as_str(),
            mode = self.mode.as_str(),
            "Starting handshake"
        );
        self.outcome = Arc::default();
        let ctx = self.build_context()?;

        let mut ssl = Ssl::new(&ctx)?;
        if self.role == SslRole::Client {
            if let Some(name) = &self.server_name {
                ssl.set_hostname(name)?;
            }
        }

        if self.mode == SslMode::Dtls {
            ssl.set_mtu(self.dtls_mtu)?;
        }

        let mut builder = SslStreamBuilder::new(ssl, TransportIo::new(self.transport.clone()));
        match self.role {
            SslRole::Client => builder.set_connect_state(),
            SslRole::Server => builder.set_accept_state(),
        }

        let result = builder.handshake();
        self.on_handshake_step(result)
    }

    fn continue_ssl(&mut self) -> Result<()> {
        self.timer.clear();
        match mem::replace(&mut self.state, SslState::Closed) {
            SslState::Connecting(mid) => {
                let result = mid.handshake();
                self.on_handshake_step(result)
            }
            other => {
                self.state = other;
                Ok(())
            }
        }
    }

    fn on_handshake_step(
        &mut self,
        result: std::result::Result<SslStream<TransportIo<T>>, HandshakeError<TransportIo<T>>>,
    ) -> Result<()> {
        match result {
            Ok(stream) => {
                self.timer.clear();
                self.post_connection_check(stream.ssl())?;
                self.peer_certificate = self.take_peer_certificate(stream.ssl());
                info!(
                    role = self.role.as_str(),
                    version = stream.ssl().version_str(),
                    "Handshake complete"
                );
                self.state = SslState::Connected(stream);
                self.push_event(StreamEvents::OPEN | StreamEvents::READ | StreamEvents::WRITE, 0);
                Ok(())
            }
            Err(HandshakeError::WouldBlock(mid)) => {
                if mid.error().code() == ErrorCode::WANT_READ && self.mode == SslMode::Dtls {
                    if let Some(delay) = dtls_get_timeout(mid.ssl()) {
                        debug!("Retransmit timer armed for {:?}", delay);
                        self.timer.arm(Instant::now(), delay);
                    }
                }
                self.state = SslState::Connecting(mid);
                Ok(())
            }
            Err(HandshakeError::SetupFailure(stack)) => Err(SslError::OpenSsl(stack)),
            Err(HandshakeError::Failure(mid)) => Err(self.classify_failure(&mid)),
        }
    }

    fn classify_failure(&self, mid: &MidHandshakeSslStream<TransportIo<T>>) -> SslError {
        let error = mid.error();
        if let Some(code) = error.io_error().and_then(transport_code) {
            return SslError::Transport(code);
        }
        let verify = mid.ssl().verify_result();
        if verify != X509VerifyResult::OK {
            return SslError::Verification(verify.error_string().to_string());
        }
        SslError::Handshake(error.to_string())
    }

    /// Traditional mode checks the host name and chain result once the
    /// handshake finished. Peer-to-peer mode was settled by the callback,
    /// and so was any client certificate seen by a server.
    fn post_connection_check(&self, ssl: &SslRef) -> Result<()> {
        let server_name = match (&self.server_name, self.role) {
            (Some(name), SslRole::Client) => name,
            _ => return Ok(()),
        };
        if self.ignore_bad_cert {
            warn!("Skipping post-connection check (ignore_bad_cert)");
            return Ok(());
        }

        let leaf = ssl
            .peer_certificate()
            .ok_or_else(|| SslError::Verification("no peer certificate".to_string()))?;
        if !matches_host(&CertInfo::from_x509_ref(&leaf), server_name) {
            return Err(SslError::Verification(format!(
                "certificate does not match '{}'",
                server_name
            )));
        }

        let verify = ssl.verify_result();
        if verify != X509VerifyResult::OK && !self.outcome.lock().custom_verification_succeeded {
            return Err(SslError::Verification(verify.error_string().to_string()));
        }
        Ok(())
    }

    fn take_peer_certificate(&self, ssl: &SslRef) -> Option<SslCertificate> {
        let leaf = self.outcome.lock().peer_certificate.take()?;
        let leaf_der = leaf.to_der().ok();
        let chain: Vec<SslCertificate> = ssl
            .peer_cert_chain()
            .map(|certs| {
                certs
                    .iter()
                    .filter(|cert| cert.to_der().ok() != leaf_der)
                    .map(|cert| SslCertificate::from_x509(cert.to_owned()))
                    .collect()
            })
            .unwrap_or_default();
        Some(leaf.with_chain(SslCertChain::new(chain)))
    }

    // Data path

    /// Read application data.
    ///
    /// Blocks until connected. A DTLS record larger than `buf` is discarded and
    /// reported as `Error(SSE_MSG_TRUNC)`.
    pub fn read(&mut self, buf: &mut [u8]) -> StreamResult {
        let stream = match &mut self.state {
            SslState::None => return self.transport.lock().read(buf),
            SslState::Wait | SslState::Connecting(_) => return StreamResult::Block,
            SslState::Closed => return StreamResult::Eos,
            SslState::Error(code) => return StreamResult::Error(*code),
            SslState::Connected(stream) => stream,
        };

        if buf.is_empty() {
            return StreamResult::Success(0);
        }

        self.read_needs_write = false;
        match stream.ssl_read(buf) {
            Ok(n) => {
                let pending = stream.ssl().pending();
                if self.mode == SslMode::Dtls && pending > 0 {
                    // Datagram reads are atomic; drop the rest of the record
                    debug!("Short DTLS read, discarding {} bytes", pending);
                    Self::flush_input(stream, pending);
                    return StreamResult::Error(SSE_MSG_TRUNC);
                }
                StreamResult::Success(n)
            }
            Err(e) => match e.code() {
                ErrorCode::WANT_READ => StreamResult::Block,
                ErrorCode::WANT_WRITE => {
                    self.read_needs_write = true;
                    StreamResult::Block
                }
                ErrorCode::ZERO_RETURN => {
                    debug!("Peer closed the session");
                    self.cleanup(false);
                    StreamResult::Eos
                }
                _ => {
                    let code = ssl_error_code(&e);
                    self.fail("ssl_read", &e, code, false);
                    StreamResult::Error(code)
                }
            },
        }
    }

    fn flush_input(stream: &mut SslStream<TransportIo<T>>, mut left: usize) {
        let mut scratch = [0u8; 512];
        while left > 0 {
            let chunk = left.min(scratch.len());
            match stream.ssl_read(&mut scratch[..chunk]) {
                Ok(n) if n > 0 => left = left.saturating_sub(n),
                _ => break,
            }
        }
    }

    /// Write application data; blocks until connected
    pub fn write(&mut self, data: &[u8]) -> StreamResult {
        let stream = match &mut self.state {
            SslState::None => return self.transport.lock().write(data),
            SslState::Wait | SslState::Connecting(_) => return StreamResult::Block,
            SslState::Closed => return StreamResult::Error(0),
            SslState::Error(code) => return StreamResult::Error(*code),
            SslState::Connected(stream) => stream,
        };

        if data.is_empty() {
            return StreamResult::Success(0);
        }

        self.write_needs_read = false;
        match stream.ssl_write(data) {
            Ok(n) => StreamResult::Success(n),
            Err(e) => match e.code() {
                ErrorCode::WANT_READ => {
                    self.write_needs_read = true;
                    StreamResult::Block
                }
                ErrorCode::WANT_WRITE => StreamResult::Block,
                _ => {
                    let code = ssl_error_code(&e);
                    self.fail("ssl_write", &e, code, false);
                    StreamResult::Error(code)
                }
            },
        }
    }

    /// Tear the session down and close the transport. Raises no event.
    pub fn close(&mut self) {
        let restart = self.should_restart();
        self.cleanup(restart);
        self.transport.lock().close();
    }

    // Events and timers

    /// Feed transport readiness into the session
    pub fn on_transport_event(&mut self, events: StreamEvents, err: i32) {
        let mut signal = StreamEvents::empty();
        let mut signal_error = 0;

        if events.contains(StreamEvents::OPEN) {
            match self.state {
                SslState::Wait => {
                    if let Err(e) = self.begin_ssl() {
                        self.error("begin_ssl", &e, true);
                        return;
                    }
                }
                SslState::None => signal |= StreamEvents::OPEN,
                _ => {}
            }
        }

        if events.contains(StreamEvents::READ | StreamEvents::WRITE) {
            match self.state {
                SslState::None => {
                    if events.contains(StreamEvents::READ) {
                        signal |= StreamEvents::READ;
                    }
                    if events.contains(StreamEvents::WRITE) {
                        signal |= StreamEvents::WRITE;
                    }
                }
                SslState::Connecting(_) => {
                    if let Err(e) = self.continue_ssl() {
                        self.error("continue_ssl", &e, true);
                        return;
                    }
                }
                SslState::Connected(_) => {
                    let readable = events.contains(StreamEvents::READ);
                    let writable = events.contains(StreamEvents::WRITE);
                    if (readable && self.write_needs_read) || writable {
                        signal |= StreamEvents::WRITE;
                    }
                    if (writable && self.read_needs_write) || readable {
                        signal |= StreamEvents::READ;
                    }
                }
                _ => {}
            }
        }

        if events.contains(StreamEvents::CLOSE) {
            debug!("Transport closed with error {}", err);
            let restart = self.should_restart();
            self.cleanup(restart);
            signal |= StreamEvents::CLOSE;
            signal_error = err;
        }

        if !signal.is_empty() {
            self.push_event(signal, signal_error);
        }
    }

    /// Next notification for the owner
    pub fn poll_event(&mut self) -> Option<SessionEvent> {
        self.events.pop_front()
    }

    /// When [`Self::handle_timeout`] should next be called
    pub fn poll_timeout(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    /// Retransmit the last handshake flight if the DTLS timer expired
    pub fn handle_timeout(&mut self, now: Instant) {
        if !self.timer.take_expired(now) {
            return;
        }
        match &self.state {
            SslState::Connecting(mid) => {
                debug!("DTLS retransmission timeout");
                dtls_handle_timeout(mid.ssl());
            }
            _ => return,
        }
        if let Err(e) = self.continue_ssl() {
            self.error("continue_ssl", &e, true);
        }
    }

    fn push_event(&mut self, events: StreamEvents, error: i32) {
        self.events.push_back(SessionEvent { events, error });
    }

    // Negotiated parameters

    fn connected_ssl(&self) -> Option<&SslRef> {
        match &self.state {
            SslState::Connected(stream) => Some(stream.ssl()),
            _ => None,
        }
    }

    /// Derive keying material from the session (RFC 5705)
    pub fn export_keying_material(
        &self,
        label: &str,
        context: Option<&[u8]>,
        length: usize,
    ) -> Result<Vec<u8>> {
        let ssl = self.connected_ssl().ok_or(SslError::InvalidState {
            operation: "export_keying_material",
            state: self.state.kind(),
        })?;
        let mut out = vec![0u8; length];
        ssl.export_keying_material(&mut out, label, context)?;
        Ok(out)
    }

    /// Negotiated SRTP profile, if both sides offered a common one
    pub fn dtls_srtp_crypto_suite(&self) -> Option<SrtpCryptoSuite> {
        if self.srtp_suites.is_empty() {
            return None;
        }
        self.connected_ssl().and_then(negotiated_srtp_suite)
    }

    /// Peer leaf certificate accepted during verification
    pub fn peer_certificate(&self) -> Option<&SslCertificate> {
        self.peer_certificate.as_ref()
    }

    /// IANA id of the negotiated cipher suite
    pub fn ssl_cipher_suite(&self) -> Option<u16> {
        self.connected_ssl()
            .and_then(|ssl| ssl.current_cipher())
            .map(|cipher| u16::from_be_bytes(cipher.protocol_id()))
    }

    /// Negotiated protocol version once connected
    pub fn ssl_version(&self) -> Option<SslProtocolVersion> {
        self.connected_ssl()
            .and_then(|ssl| ssl.version2())
            .and_then(SslProtocolVersion::from_openssl_version)
    }

    /// Negotiated parameters and peer certificate details once connected
    pub fn connection_info(&self) -> Option<ConnectionInfo> {
        self.connected_ssl().map(ConnectionInfo::from_ssl)
    }

    // Teardown

    /// Move to a terminal state after a failure
    fn error(&mut self, context: &str, err: &SslError, signal: bool) {
        self.fail(context, err, err.code(), signal);
    }

    fn fail(&mut self, context: &str, err: &dyn std::fmt::Display, code: i32, signal: bool) {
        warn!(role = self.role.as_str(), "{} failed: {}", context, err);
        self.state = SslState::Error(code);
        self.cleanup(false);
        if signal {
            self.push_event(StreamEvents::CLOSE, code);
        }
    }

    fn should_restart(&self) -> bool {
        self.restartable && !matches!(self.state, SslState::None)
    }

    /// Drop per-session state. With `restart` the adapter goes back to
    /// `Wait`; a restartable adapter keeps its identity either way.
    fn cleanup(&mut self, restart: bool) {
        debug!(role = self.role.as_str(), "Cleanup from {:?}", self.state.kind());
        match mem::replace(&mut self.state, SslState::Closed) {
            SslState::Connected(mut stream) => {
                if let Err(e) = stream.shutdown() {
                    debug!("Shutdown did not complete: {}", e);
                }
            }
            SslState::Error(code) => self.state = SslState::Error(code),
            _ => {}
        }

        if restart {
            self.state = SslState::Wait;
        }
        if !self.restartable {
            self.identity = None;
        }
        self.peer_certificate = None;
        self.read_needs_write = false;
        self.write_needs_read = false;
        self.timer.clear();
    }
}

impl<T: Transport + 'static> Drop for SslStreamAdapter<T> {
    fn drop(&mut self) {
        if matches!(self.state, SslState::Connected(_)) {
            self.cleanup(false);
        }
    }
}

fn ssl_error_code(err: &openssl::ssl::Error) -> i32 {
    err.io_error()
        .and_then(transport_code)
        .unwrap_or_else(|| err.code().as_raw())
}
