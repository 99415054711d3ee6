//! X.509 certificate handles
//!
//! [`SslCertificate`] wraps one OpenSSL certificate plus the chain it was
//! received with. [`CertInfo`] extracts the names used for server-name
//! matching.

use super::asn1_time::asn1_time_to_sec;
use super::digest::{compute_digest, digest_algorithm_for_nid};
use super::fingerprint::SslFingerprint;
use super::pem::{der_to_pem, pem_to_der, PEM_TYPE_CERTIFICATE};
use crate::error::{Result, SslError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use foreign_types::ForeignTypeRef;
use openssl::nid::Nid;
use openssl::x509::{X509NameRef, X509Ref, X509};

/// GeneralizedTime length (`YYYYMMDDHHMMSSZ`)
const ASN1_LONG_TIME_LEN: usize = 15;

/// One X.509 certificate
///
/// Cloning shares the underlying OpenSSL object; both handles can be
/// dropped independently.
#[derive(Debug, Clone)]
pub struct SslCertificate {
    x509: X509,
    chain: Option<SslCertChain>,
}

impl SslCertificate {
    pub(crate) fn from_x509(x509: X509) -> Self {
        SslCertificate { x509, chain: None }
    }

    /// Attach the certificates that were received after this one
    pub(crate) fn with_chain(mut self, chain: SslCertChain) -> Self {
        self.chain = if chain.is_empty() { None } else { Some(chain) };
        self
    }

    pub(crate) fn x509(&self) -> &X509Ref {
        &self.x509
    }

    /// Parse the first `CERTIFICATE` block of a PEM string
    pub fn from_pem_string(pem: &str) -> Result<Self> {
        let der = pem_to_der(PEM_TYPE_CERTIFICATE, pem)?;
        Self::from_der(&der)
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        let x509 = X509::from_der(der)
            .map_err(|e| SslError::MalformedInput(format!("bad DER certificate: {}", e)))?;
        Ok(Self::from_x509(x509))
    }

    pub fn to_pem_string(&self) -> Result<String> {
        Ok(der_to_pem(PEM_TYPE_CERTIFICATE, &self.to_der()?))
    }

    pub fn to_der(&self) -> Result<Vec<u8>> {
        Ok(self.x509.to_der()?)
    }

    /// Certificates received after this one, if any
    pub fn chain(&self) -> Option<&SslCertChain> {
        self.chain.as_ref()
    }

    /// Name of the digest used in this certificate's signature
    pub fn signature_digest_algorithm(&self) -> Result<&'static str> {
        let nid = self.x509.signature_algorithm().object().nid();
        nid.signature_algorithms()
            .and_then(|algs| digest_algorithm_for_nid(algs.digest))
            .ok_or_else(|| {
                SslError::UnsupportedAlgorithm(format!("signature algorithm nid {}", nid.as_raw()))
            })
    }

    /// Digest of the DER encoding with the named algorithm
    pub fn compute_digest(&self, algorithm: &str) -> Result<Vec<u8>> {
        compute_digest(algorithm, &self.to_der()?)
    }

    /// `notAfter` in seconds since the epoch, or -1 if it cannot be read
    pub fn certificate_expiration_time(&self) -> i64 {
        let not_after = self.x509.not_after();

        // SAFETY: an ASN1_TIME is an ASN1_STRING, and the returned buffer
        // lives as long as self.x509, which outlives the slice below.
        let bytes = unsafe {
            let raw = not_after.as_ptr() as *const openssl_sys::ASN1_STRING;
            let len = openssl_sys::ASN1_STRING_length(raw);
            let data = openssl_sys::ASN1_STRING_get0_data(raw);
            if data.is_null() || len < 0 {
                return -1;
            }
            std::slice::from_raw_parts(data, len as usize)
        };

        asn1_time_to_sec(bytes, bytes.len() == ASN1_LONG_TIME_LEN)
    }

    /// Subject, issuer and alternative names
    pub fn info(&self) -> CertInfo {
        CertInfo::from_x509_ref(&self.x509)
    }

    /// Fingerprint statistics for this certificate and its issuers
    pub fn stats(&self) -> Result<SslCertificateStats> {
        let issuer = match &self.chain {
            Some(chain) => chain.stats()?,
            None => None,
        };
        self.stats_with_issuer(issuer)
    }

    fn stats_with_issuer(
        &self,
        issuer: Option<Box<SslCertificateStats>>,
    ) -> Result<SslCertificateStats> {
        let algorithm = self.signature_digest_algorithm()?;
        let fingerprint = SslFingerprint::create_from_certificate(algorithm, self)?;
        Ok(SslCertificateStats {
            fingerprint: fingerprint.rfc4572_fingerprint(),
            fingerprint_algorithm: algorithm.to_string(),
            base64_certificate: STANDARD.encode(self.to_der()?),
            issuer,
        })
    }
}

impl PartialEq for SslCertificate {
    fn eq(&self, other: &Self) -> bool {
        match (self.x509.to_der(), other.x509.to_der()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for SslCertificate {}

/// Ordered certificate chain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SslCertChain {
    certs: Vec<SslCertificate>,
}

impl SslCertChain {
    pub fn new(certs: Vec<SslCertificate>) -> Self {
        SslCertChain { certs }
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SslCertificate> {
        self.certs.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SslCertificate> {
        self.certs.iter()
    }

    /// Stats for the chain, each element linked to the next as its issuer
    pub fn stats(&self) -> Result<Option<Box<SslCertificateStats>>> {
        let mut issuer = None;
        for cert in self.certs.iter().rev() {
            issuer = Some(Box::new(cert.stats_with_issuer(issuer)?));
        }
        Ok(issuer)
    }
}

impl From<SslCertificate> for SslCertChain {
    fn from(cert: SslCertificate) -> Self {
        SslCertChain { certs: vec![cert] }
    }
}

/// Per-certificate statistics, linked towards the root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SslCertificateStats {
    /// Upper-case colon-delimited hex digest
    pub fingerprint: String,
    pub fingerprint_algorithm: String,
    /// Base64 of the DER encoding, unwrapped
    pub base64_certificate: String,
    pub issuer: Option<Box<SslCertificateStats>>,
}

/// Certificate names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertInfo {
    /// Subject Common Name
    pub subject: Option<String>,
    /// Issuer Common Name
    pub issuer: Option<String>,
    /// DNS names from the subjectAltName extension
    pub dns_names: Vec<String>,
}

impl CertInfo {
    pub fn from_x509_ref(cert: &X509Ref) -> Self {
        CertInfo {
            subject: Self::common_name(cert.subject_name()),
            issuer: Self::common_name(cert.issuer_name()),
            dns_names: cert
                .subject_alt_names()
                .map(|names| {
                    names
                        .iter()
                        .filter_map(|name| name.dnsname().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    fn common_name(name: &X509NameRef) -> Option<String> {
        name.entries_by_nid(Nid::COMMONNAME)
            .next()
            .and_then(|entry| entry.data().to_string().ok())
    }
}
