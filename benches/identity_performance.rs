//! Identity and handshake benchmarks
//!
//! This benchmark suite measures:
//! - PEM encoding/decoding of certificates
//! - ASN.1 time parsing
//! - Fingerprint computation and RFC 4572 parsing
//! - ECDSA identity generation
//! - A full peer-to-peer handshake over an in-memory transport
//!
//! Run with: cargo bench --bench identity_performance

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rtcssl::identity::{
    asn1_time_to_sec, der_to_pem, pem_to_der, KeyParams, SslFingerprint, SslIdentity,
    DIGEST_SHA_1, DIGEST_SHA_256, DIGEST_SHA_512,
};
use rtcssl::identity::pem::PEM_TYPE_CERTIFICATE;
use rtcssl::stream::{SslMode, SslRole, SslStateKind, SslStreamAdapter};
use rtcssl::transport::memory::{Framing, MemoryTransport};
use rtcssl::transport::StreamEvents;
use std::time::Duration;

fn identity(name: &str) -> SslIdentity {
    SslIdentity::generate(name, &KeyParams::default(), 86_400).unwrap()
}

// ========== PEM ==========

fn bench_pem(c: &mut Criterion) {
    let mut group = c.benchmark_group("pem");
    let cert = identity("bench");
    let pem = cert.certificate().to_pem_string().unwrap();
    let der = cert.certificate().to_der().unwrap();

    group.bench_function("pem_to_der", |b| {
        b.iter(|| black_box(pem_to_der(PEM_TYPE_CERTIFICATE, black_box(&pem)).unwrap()));
    });
    group.bench_function("der_to_pem", |b| {
        b.iter(|| black_box(der_to_pem(PEM_TYPE_CERTIFICATE, black_box(&der))));
    });
    group.finish();
}

// ========== ASN.1 time ==========

fn bench_asn1_time(c: &mut Criterion) {
    let mut group = c.benchmark_group("asn1_time");
    group.bench_function("short_format", |b| {
        b.iter(|| black_box(asn1_time_to_sec(black_box(b"151130174156Z"), false)));
    });
    group.bench_function("long_format", |b| {
        b.iter(|| black_box(asn1_time_to_sec(black_box(b"20160229000000Z"), true)));
    });
    group.finish();
}

// ========== Fingerprints ==========

fn bench_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint");
    let id = identity("bench");

    for algorithm in [DIGEST_SHA_1, DIGEST_SHA_256, DIGEST_SHA_512] {
        group.bench_with_input(BenchmarkId::new("create", algorithm), &algorithm, |b, alg| {
            b.iter(|| black_box(SslFingerprint::create(alg, &id).unwrap()));
        });
    }

    let text = SslFingerprint::create(DIGEST_SHA_256, &id)
        .unwrap()
        .rfc4572_fingerprint();
    group.bench_function("parse_rfc4572", |b| {
        b.iter(|| {
            black_box(SslFingerprint::create_from_rfc4572(DIGEST_SHA_256, black_box(&text)).unwrap())
        });
    });
    group.finish();
}

// ========== Generation ==========

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    group.sample_size(20);
    group.bench_function("ecdsa_p256", |b| {
        b.iter(|| black_box(identity("bench")));
    });
    group.finish();
}

// ========== Handshake ==========

fn handshake(mode: SslMode, client_id: &SslIdentity, server_id: &SslIdentity) {
    let framing = match mode {
        SslMode::Tls => Framing::Stream,
        SslMode::Dtls => Framing::Datagram,
    };
    let (a, b) = MemoryTransport::pair(framing);
    let mut client = SslStreamAdapter::new(a);
    let mut server = SslStreamAdapter::new(b);

    for (session, role, local, remote) in [
        (&mut client, SslRole::Client, client_id, server_id),
        (&mut server, SslRole::Server, server_id, client_id),
    ] {
        let fp = SslFingerprint::create(DIGEST_SHA_256, remote).unwrap();
        session.set_mode(mode).unwrap();
        session.set_role(role).unwrap();
        session.set_identity(local.clone()).unwrap();
        session
            .set_peer_certificate_digest(&fp.algorithm, &fp.digest)
            .unwrap();
        session.start_with_peer().unwrap();
    }

    for _ in 0..20 {
        for session in [&mut client, &mut server] {
            if session.state() == SslStateKind::Connecting {
                session.on_transport_event(StreamEvents::READ | StreamEvents::WRITE, 0);
            }
        }
        if client.state() == SslStateKind::Connected && server.state() == SslStateKind::Connected
        {
            return;
        }
    }
    panic!("handshake did not complete");
}

fn bench_handshake(c: &mut Criterion) {
    let mut group = c.benchmark_group("handshake");
    group.sample_size(20);
    let client_id = identity("client");
    let server_id = identity("server");

    for mode in [SslMode::Tls, SslMode::Dtls] {
        group.bench_with_input(
            BenchmarkId::new("peer", mode.as_str()),
            &mode,
            |b, mode| {
                b.iter(|| handshake(*mode, &client_id, &server_id));
            },
        );
    }
    group.finish();
}

criterion_group!(encoding, bench_pem, bench_asn1_time, bench_fingerprint);

criterion_group! {
    name = crypto;
    config = Criterion::default().measurement_time(Duration::from_secs(10));
    targets = bench_generate, bench_handshake
}

criterion_main!(encoding, crypto);
