//! Traditional (CA) trust mode integration tests
//!
//! The client validates the server chain against explicit trust anchors
//! and checks the server name; a custom verifier or `ignore_bad_cert` can
//! override a failed validation.

mod common;

use common::*;
use rtcssl::identity::{SslCertificate, SslIdentity};
use rtcssl::stream::{SslRole, SslStateKind, SslStreamAdapter};
use rtcssl::transport::memory::{Framing, MemoryTransport};
use rtcssl::transport::StreamEvents;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const HANDSHAKE_LIMIT: Duration = Duration::from_secs(10);

fn server_for(identity: SslIdentity, b: MemoryTransport) -> SslStreamAdapter<MemoryTransport> {
    let mut server = SslStreamAdapter::new(b);
    server.set_role(SslRole::Server).unwrap();
    server.set_identity(identity).unwrap();
    server.set_client_auth_enabled(false).unwrap();
    server.start_with_server("client").unwrap();
    server
}

/// Run a handshake against a server whose certificate names `example.com`
fn handshake_with<F>(
    configure: F,
    server_name: &str,
) -> (
    SslStreamAdapter<MemoryTransport>,
    SslStreamAdapter<MemoryTransport>,
    SslIdentity,
)
where
    F: FnOnce(&mut SslStreamAdapter<MemoryTransport>, &SslIdentity),
{
    init_tracing();
    let (a, b) = MemoryTransport::pair(Framing::Stream);
    let server_id = identity("example.com");

    let mut client = SslStreamAdapter::new(a);
    configure(&mut client, &server_id);
    client.start_with_server(server_name).unwrap();

    let mut server = server_for(server_id.clone(), b);
    run_handshake(&mut client, &mut server, HANDSHAKE_LIMIT);
    (client, server, server_id)
}

fn trust(client: &mut SslStreamAdapter<MemoryTransport>, server_id: &SslIdentity) {
    client
        .add_trusted_root(server_id.certificate().clone())
        .unwrap();
}

#[test]
fn test_trusted_server() {
    let (client, server, server_id) = handshake_with(trust, "example.com");
    assert_eq!(client.state(), SslStateKind::Connected);
    assert_eq!(server.state(), SslStateKind::Connected);
    assert_eq!(client.peer_certificate(), Some(server_id.certificate()));

    let info = client.connection_info().unwrap();
    assert_eq!(info.cert(0).and_then(|c| c.subject.as_deref()), Some("example.com"));
}

#[test]
fn test_server_name_is_case_insensitive() {
    let (client, _server, _) = handshake_with(trust, "EXAMPLE.com");
    assert_eq!(client.state(), SslStateKind::Connected);
}

#[test]
fn test_server_name_mismatch() {
    let (mut client, _server, _) = handshake_with(trust, "other.example.org");
    assert_eq!(client.state(), SslStateKind::Error);
    assert!(client.peer_certificate().is_none());

    let events = drain_events(&mut client);
    assert!(has_event(&events, StreamEvents::CLOSE));
    assert!(!has_event(&events, StreamEvents::OPEN));
}

#[test]
fn test_untrusted_server() {
    let (mut client, _server, _) = handshake_with(|_, _| {}, "example.com");
    assert_eq!(client.state(), SslStateKind::Error);
    assert!(has_event(&drain_events(&mut client), StreamEvents::CLOSE));
}

#[test]
fn test_ignore_bad_cert() {
    let (client, _server, _) = handshake_with(
        |client, _| client.set_ignore_bad_cert(true).unwrap(),
        "not-the-name",
    );
    assert_eq!(client.state(), SslStateKind::Connected);
}

#[test]
fn test_custom_verifier_accepts() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    let (client, _server, _) = handshake_with(
        move |client, server_id| {
            let expected = server_id.certificate().clone();
            client
                .set_verifier(Arc::new(move |cert: &SslCertificate| {
                    seen.fetch_add(1, Ordering::SeqCst);
                    *cert == expected
                }))
                .unwrap();
        },
        "example.com",
    );
    assert_eq!(client.state(), SslStateKind::Connected);
    assert!(calls.load(Ordering::SeqCst) >= 1);
}

#[test]
fn test_custom_verifier_rejects() {
    let (client, _server, _) = handshake_with(
        |client, _| {
            client
                .set_verifier(Arc::new(|_: &SslCertificate| false))
                .unwrap();
        },
        "example.com",
    );
    assert_eq!(client.state(), SslStateKind::Error);
}

#[test]
fn test_custom_verifier_does_not_bypass_name_check() {
    let (client, _server, _) = handshake_with(
        |client, _| {
            client
                .set_verifier(Arc::new(|_: &SslCertificate| true))
                .unwrap();
        },
        "wrong.example.net",
    );
    assert_eq!(client.state(), SslStateKind::Error);
}

#[test]
fn test_server_name_excludes_peer_digest() {
    let (a, _b) = MemoryTransport::pair(Framing::Stream);
    let mut client = SslStreamAdapter::new(a);
    let fp = fingerprint(&identity("server"));
    client
        .set_peer_certificate_digest(&fp.algorithm, &fp.digest)
        .unwrap();
    assert!(client.start_with_server("example.com").is_err());
    assert_eq!(client.state(), SslStateKind::None);
}
