//! Peer certificate verification
//!
//! Two trust models are supported. In peer-to-peer mode the leaf
//! certificate must hash to the digest exchanged out of band and nothing
//! else about the chain is checked. In traditional mode the chain is
//! validated against the trust store and the leaf must name the server.
//! An optional [`CertificateVerifier`] can rescue a chain that failed
//! validation.

use crate::identity::{CertInfo, SslCertificate};
use openssl::x509::X509StoreContextRef;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Custom verification strategy consulted when chain validation fails
pub trait CertificateVerifier: Send + Sync {
    /// Return true to accept `certificate` despite the validation failure
    fn verify(&self, certificate: &SslCertificate) -> bool;
}

impl<F> CertificateVerifier for F
where
    F: Fn(&SslCertificate) -> bool + Send + Sync,
{
    fn verify(&self, certificate: &SslCertificate) -> bool {
        self(certificate)
    }
}

/// What the verify callback observed during one handshake
#[derive(Debug, Default)]
pub(crate) struct VerifyOutcome {
    /// Leaf certificate, recorded once it has been accepted
    pub peer_certificate: Option<SslCertificate>,
    /// The custom verifier accepted a certificate chain validation rejected
    pub custom_verification_succeeded: bool,
}

/// Verification inputs captured by the verify callback
#[derive(Clone)]
pub(crate) struct VerifyPolicy {
    /// Pinned (algorithm, digest) in peer-to-peer mode
    pub peer_digest: Option<(String, Vec<u8>)>,
    pub verifier: Option<Arc<dyn CertificateVerifier>>,
    pub ignore_bad_cert: bool,
    pub outcome: Arc<Mutex<VerifyOutcome>>,
}

impl VerifyPolicy {
    /// OpenSSL verify callback body
    pub(crate) fn verify(&self, preverify_ok: bool, ctx: &mut X509StoreContextRef) -> bool {
        match &self.peer_digest {
            Some((algorithm, digest)) => self.verify_peer_digest(algorithm, digest, ctx),
            None => self.verify_chain(preverify_ok, ctx),
        }
    }

    fn verify_peer_digest(
        &self,
        algorithm: &str,
        expected: &[u8],
        ctx: &mut X509StoreContextRef,
    ) -> bool {
        // Only the leaf is pinned; intermediates are accepted as is
        if ctx.error_depth() > 0 {
            return true;
        }

        let cert = match ctx.current_cert() {
            Some(cert) => SslCertificate::from_x509(cert.to_owned()),
            None => return false,
        };

        let matches = match cert.compute_digest(algorithm) {
            Ok(digest) => digest == expected,
            Err(e) => {
                warn!("Failed to digest peer certificate: {}", e);
                false
            }
        };

        if !matches {
            if self.ignore_bad_cert {
                warn!("Peer certificate digest mismatch ignored (ignore_bad_cert)");
            } else {
                info!("Rejected peer certificate: {} digest mismatch", algorithm);
                return false;
            }
        } else {
            debug!("Accepted peer certificate by {} digest", algorithm);
        }

        self.outcome.lock().peer_certificate = Some(cert);
        true
    }

    fn verify_chain(&self, preverify_ok: bool, ctx: &mut X509StoreContextRef) -> bool {
        let depth = ctx.error_depth();
        let cert = ctx
            .current_cert()
            .map(|cert| SslCertificate::from_x509(cert.to_owned()));

        let mut ok = preverify_ok;
        if !ok {
            debug!(
                "Chain validation failed at depth {}: {}",
                depth,
                ctx.error().error_string()
            );
            if let (Some(verifier), Some(cert)) = (&self.verifier, &cert) {
                if verifier.verify(cert) {
                    info!("Custom verifier accepted certificate at depth {}", depth);
                    self.outcome.lock().custom_verification_succeeded = true;
                    ok = true;
                }
            }
        }

        if !ok && self.ignore_bad_cert {
            warn!("Ignoring certificate error at depth {} (ignore_bad_cert)", depth);
            ok = true;
        }

        if ok && depth == 0 {
            self.outcome.lock().peer_certificate = cert;
        }
        ok
    }
}

/// Check that `info` names `host`.
///
/// DNS subjectAltNames are matched with `*`/`?` wildcards; the subject
/// Common Name is consulted only when the certificate has no DNS names.
pub fn matches_host(info: &CertInfo, host: &str) -> bool {
    if !info.dns_names.is_empty() {
        return info
            .dns_names
            .iter()
            .any(|pattern| wildcard_match(pattern.as_bytes(), host.as_bytes()));
    }
    info.subject
        .as_deref()
        .map_or(false, |cn| cn.eq_ignore_ascii_case(host))
}

fn wildcard_match(pattern: &[u8], text: &[u8]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some((b'*', rest)) => (0..=text.len()).any(|skip| wildcard_match(rest, &text[skip..])),
        Some((b'?', rest)) => !text.is_empty() && wildcard_match(rest, &text[1..]),
        Some((c, rest)) => match text.split_first() {
            Some((t, text_rest)) => {
                c.eq_ignore_ascii_case(t) && wildcard_match(rest, text_rest)
            }
            None => false,
        },
    }
}
