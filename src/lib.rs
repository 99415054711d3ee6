//! rtcssl - TLS/DTLS secure transport for real-time sessions
//!
//! This crate layers an OpenSSL-driven TLS or DTLS handshake on top of a
//! non-blocking [`transport::Transport`], together with the identity model
//! (keys, certificates, fingerprints) used to authenticate peers either
//! through a CA chain or through an out-of-band certificate fingerprint.
//!
//! # Architecture
//!
//! 1. [`identity`] holds immutable key and certificate handles, PEM/DER
//!    conversion and RFC 4572 fingerprints
//! 2. [`transport`] defines the byte/packet transport boundary plus an
//!    in-memory pair and an OS socket implementation
//! 3. [`stream`] contains [`stream::SslStreamAdapter`], the handshake state
//!    machine driven by transport readiness events
//! 4. [`generator`] produces certificates on a worker queue and reports
//!    back on the origin queue
//!
//! # Example
//!
//! ```no_run
//! use rtcssl::identity::{KeyParams, SslFingerprint, SslIdentity, DIGEST_SHA_256};
//! use rtcssl::stream::{SslMode, SslStreamAdapter};
//! use rtcssl::transport::memory::{Framing, MemoryTransport};
//!
//! let (local, _remote) = MemoryTransport::pair(Framing::Datagram);
//! let identity = SslIdentity::generate("local", &KeyParams::default(), 86400).unwrap();
//! let remote_identity = SslIdentity::generate("remote", &KeyParams::default(), 86400).unwrap();
//! let remote_fp = SslFingerprint::create(DIGEST_SHA_256, &remote_identity).unwrap();
//!
//! let mut session = SslStreamAdapter::new(local);
//! session.set_mode(SslMode::Dtls).unwrap();
//! session.set_identity(identity).unwrap();
//! session
//!     .set_peer_certificate_digest(&remote_fp.algorithm, &remote_fp.digest)
//!     .unwrap();
//! session.start_with_peer().unwrap();
//! ```

pub mod error;
pub mod generator;
pub mod identity;
pub mod stream;
pub mod transport;

pub use error::{Result, SslError};
