//! RFC 4572 certificate fingerprints

use super::certificate::SslCertificate;
use super::digest::{
    is_fips180_digest_algorithm, message_digest, DIGEST_MD5, DIGEST_SHA_224, DIGEST_SHA_256,
    MAX_DIGEST_SIZE,
};
use super::rtc_certificate::RtcCertificate;
use super::ssl_identity::SslIdentity;
use crate::error::{Result, SslError};
use std::fmt;

/// Certificate digest used to pin a peer out of band
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SslFingerprint {
    pub algorithm: String,
    pub digest: Vec<u8>,
}

impl SslFingerprint {
    /// Fingerprint of an identity's certificate
    pub fn create(algorithm: &str, identity: &SslIdentity) -> Result<Self> {
        Self::create_from_certificate(algorithm, identity.certificate())
    }

    /// Fingerprint of a certificate. Any known digest is accepted here,
    /// including md5.
    pub fn create_from_certificate(algorithm: &str, cert: &SslCertificate) -> Result<Self> {
        if message_digest(algorithm).is_none() {
            return Err(SslError::UnsupportedAlgorithm(algorithm.to_string()));
        }
        Ok(SslFingerprint {
            algorithm: algorithm.to_string(),
            digest: cert.compute_digest(algorithm)?,
        })
    }

    /// Parse the hex part of an SDP `a=fingerprint` line
    pub fn create_from_rfc4572(algorithm: &str, fingerprint: &str) -> Result<Self> {
        if !is_fips180_digest_algorithm(algorithm) {
            return Err(SslError::UnsupportedAlgorithm(algorithm.to_string()));
        }
        if fingerprint.is_empty() {
            return Err(SslError::MalformedInput("empty fingerprint".to_string()));
        }

        let mut digest = Vec::with_capacity(MAX_DIGEST_SIZE);
        for part in fingerprint.split(':') {
            if part.len() != 2 || digest.len() == MAX_DIGEST_SIZE {
                return Err(SslError::MalformedInput(format!(
                    "bad fingerprint '{}'",
                    fingerprint
                )));
            }
            let mut byte = [0u8; 1];
            hex::decode_to_slice(part, &mut byte).map_err(|e| {
                SslError::MalformedInput(format!("bad fingerprint '{}': {}", fingerprint, e))
            })?;
            digest.push(byte[0]);
        }

        Ok(SslFingerprint {
            algorithm: algorithm.to_string(),
            digest,
        })
    }

    /// Fingerprint of an RTC certificate using its signature digest.
    ///
    /// md5 and sha-224 signatures are fingerprinted with sha-256 instead.
    pub fn create_from_rtc_certificate(certificate: &RtcCertificate) -> Result<Self> {
        let cert = certificate.ssl_certificate();
        let algorithm = match cert.signature_digest_algorithm()? {
            DIGEST_MD5 | DIGEST_SHA_224 => DIGEST_SHA_256,
            other => other,
        };
        Self::create_from_certificate(algorithm, cert)
    }

    /// Upper-case colon-delimited hex
    pub fn rfc4572_fingerprint(&self) -> String {
        self.digest
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(":")
    }
}

impl fmt::Display for SslFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.algorithm, self.rfc4572_fingerprint())
    }
}
