//! Shared certificate handle used by peer connections

use super::certificate::SslCertificate;
use super::ssl_identity::SslIdentity;
use crate::error::Result;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Reference-counted handle owning one [`SslIdentity`]
#[derive(Debug, Clone)]
pub struct RtcCertificate {
    identity: Arc<SslIdentity>,
}

impl RtcCertificate {
    pub fn create(identity: SslIdentity) -> Self {
        RtcCertificate {
            identity: Arc::new(identity),
        }
    }

    pub fn from_pem(pem: &RtcCertificatePem) -> Result<Self> {
        let identity = SslIdentity::from_pem_strings(&pem.private_key, &pem.certificate)?;
        Ok(Self::create(identity))
    }

    pub fn identity(&self) -> &SslIdentity {
        &self.identity
    }

    pub fn ssl_certificate(&self) -> &SslCertificate {
        self.identity.certificate()
    }

    /// Expiration in milliseconds since the epoch, or 0 if unknown
    pub fn expires(&self) -> u64 {
        let secs = self.ssl_certificate().certificate_expiration_time();
        if secs < 0 {
            0
        } else {
            secs as u64 * 1000
        }
    }

    /// True once `now_ms` has reached the expiration time
    pub fn has_expired(&self, now_ms: u64) -> bool {
        self.expires() <= now_ms
    }

    pub fn to_pem(&self) -> Result<RtcCertificatePem> {
        Ok(RtcCertificatePem {
            private_key: self.identity.private_key_to_pem_string()?,
            certificate: self.ssl_certificate().to_pem_string()?,
        })
    }
}

impl PartialEq for RtcCertificate {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.identity, &other.identity) || *self.identity == *other.identity
    }
}

impl Eq for RtcCertificate {}

/// Text form of an [`RtcCertificate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtcCertificatePem {
    pub private_key: String,
    pub certificate: String,
}

impl RtcCertificatePem {
    pub fn new(private_key: impl Into<String>, certificate: impl Into<String>) -> Self {
        RtcCertificatePem {
            private_key: private_key.into(),
            certificate: certificate.into(),
        }
    }

    /// Read the key and certificate from separate PEM files
    pub fn load<P: AsRef<Path>>(key_path: P, cert_path: P) -> Result<Self> {
        Ok(RtcCertificatePem {
            private_key: fs::read_to_string(key_path)?,
            certificate: fs::read_to_string(cert_path)?,
        })
    }

    pub fn save<P: AsRef<Path>>(&self, key_path: P, cert_path: P) -> Result<()> {
        fs::write(key_path, &self.private_key)?;
        fs::write(cert_path, &self.certificate)?;
        Ok(())
    }
}
