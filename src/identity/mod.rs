//! Identity model
//!
//! Keys, certificates and fingerprints. Every type here is immutable once
//! built and can be shared across threads by cloning.

pub mod asn1_time;
pub mod certificate;
pub mod digest;
pub mod fingerprint;
pub mod key_params;
pub mod pem;
pub mod rtc_certificate;
pub mod ssl_identity;

#[cfg(test)]
pub(crate) mod fixtures;

pub use asn1_time::asn1_time_to_sec;
pub use certificate::{CertInfo, SslCertChain, SslCertificate, SslCertificateStats};
pub use digest::{
    DIGEST_MD5, DIGEST_SHA_1, DIGEST_SHA_224, DIGEST_SHA_256, DIGEST_SHA_384, DIGEST_SHA_512,
};
pub use fingerprint::SslFingerprint;
pub use key_params::{EcCurve, KeyParams, KeyType, RsaParams, SslIdentityParams};
pub use pem::{der_to_pem, pem_to_der};
pub use rtc_certificate::{RtcCertificate, RtcCertificatePem};
pub use ssl_identity::SslIdentity;
