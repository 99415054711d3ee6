//! Session configuration enums

use crate::error::SslError;
use openssl::ssl::SslVersion;

/// Record layer flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SslMode {
    /// TLS over a reliable, ordered byte stream
    Tls,
    /// DTLS over an unreliable packet transport
    Dtls,
}

impl SslMode {
    pub fn from_str(s: &str) -> Result<Self, SslError> {
        match s.to_uppercase().as_str() {
            "TLS" => Ok(SslMode::Tls),
            "DTLS" => Ok(SslMode::Dtls),
            _ => Err(SslError::Configuration(format!("unknown mode '{}'", s))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SslMode::Tls => "TLS",
            SslMode::Dtls => "DTLS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SslRole {
    Client,
    Server,
}

impl SslRole {
    pub fn from_str(s: &str) -> Result<Self, SslError> {
        match s.to_lowercase().as_str() {
            "client" => Ok(SslRole::Client),
            "server" => Ok(SslRole::Server),
            _ => Err(SslError::Configuration(format!("unknown role '{}'", s))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SslRole::Client => "client",
            SslRole::Server => "server",
        }
    }
}

/// Protocol version ceiling
///
/// DTLS has no 1.1; DTLS 1.0 is treated as `Tls11` and DTLS 1.2 as `Tls12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SslProtocolVersion {
    Tls10,
    Tls11,
    Tls12,
}

impl SslProtocolVersion {
    pub fn from_str(s: &str) -> Result<Self, SslError> {
        match s.to_uppercase().as_str() {
            "TLSV1.0" | "TLS1.0" | "TLSV1" | "TLS1" => Ok(SslProtocolVersion::Tls10),
            "TLSV1.1" | "TLS1.1" | "DTLSV1.0" | "DTLS1.0" | "DTLSV1" | "DTLS1" => {
                Ok(SslProtocolVersion::Tls11)
            }
            "TLSV1.2" | "TLS1.2" | "DTLSV1.2" | "DTLS1.2" => Ok(SslProtocolVersion::Tls12),
            _ => Err(SslError::Configuration(format!(
                "unknown protocol version '{}'",
                s
            ))),
        }
    }

    pub fn as_str(&self, mode: SslMode) -> &'static str {
        match (mode, self) {
            (SslMode::Tls, SslProtocolVersion::Tls10) => "TLSv1.0",
            (SslMode::Tls, SslProtocolVersion::Tls11) => "TLSv1.1",
            (SslMode::Tls, SslProtocolVersion::Tls12) => "TLSv1.2",
            (SslMode::Dtls, SslProtocolVersion::Tls12) => "DTLSv1.2",
            (SslMode::Dtls, _) => "DTLSv1.0",
        }
    }

    /// OpenSSL maximum protocol version for this ceiling in `mode`
    pub fn to_openssl_version(&self, mode: SslMode) -> SslVersion {
        match (mode, self) {
            (SslMode::Tls, SslProtocolVersion::Tls10) => SslVersion::TLS1,
            (SslMode::Tls, SslProtocolVersion::Tls11) => SslVersion::TLS1_1,
            (SslMode::Tls, SslProtocolVersion::Tls12) => SslVersion::TLS1_2,
            (SslMode::Dtls, SslProtocolVersion::Tls12) => SslVersion::DTLS1_2,
            (SslMode::Dtls, _) => SslVersion::DTLS1,
        }
    }

    /// Map a negotiated OpenSSL version back to a ceiling value
    pub fn from_openssl_version(version: SslVersion) -> Option<Self> {
        if version == SslVersion::TLS1 {
            Some(SslProtocolVersion::Tls10)
        } else if version == SslVersion::TLS1_1 || version == SslVersion::DTLS1 {
            Some(SslProtocolVersion::Tls11)
        } else if version == SslVersion::TLS1_2 || version == SslVersion::DTLS1_2 {
            Some(SslProtocolVersion::Tls12)
        } else {
            None
        }
    }
}

impl Default for SslProtocolVersion {
    fn default() -> Self {
        SslProtocolVersion::Tls12
    }
}
