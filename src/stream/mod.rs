//! Secure stream adapter
//!
//! Everything needed to run TLS or DTLS over a [`crate::transport::Transport`]:
//! session configuration, the handshake state machine, peer verification,
//! SRTP profile negotiation and cipher policy.

pub mod adapter;
pub(crate) mod bio;
pub mod cipher;
pub mod config;
pub mod info;
pub mod srtp;
pub(crate) mod timer;
pub mod verify;

pub use adapter::{SslStateKind, SslStreamAdapter, DEFAULT_DTLS_MTU, SSE_MSG_TRUNC};
pub use cipher::{is_acceptable_cipher, is_acceptable_cipher_name, DEFAULT_CIPHER_LIST};
pub use config::{SslMode, SslProtocolVersion, SslRole};
pub use info::ConnectionInfo;
pub use srtp::SrtpCryptoSuite;
pub use verify::{matches_host, CertificateVerifier};
