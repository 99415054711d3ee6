//! Negotiated session parameters
//!
//! A snapshot taken from a connected session: protocol, cipher, SRTP
//! profile and the names on the peer's certificate chain.

use super::srtp::SrtpCryptoSuite;
use crate::identity::CertInfo;
use openssl::ssl::SslRef;

#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    /// Negotiated protocol (e.g. "DTLSv1.2")
    pub version: String,

    /// OpenSSL cipher name
    pub cipher: String,

    /// IANA id of the negotiated cipher suite
    pub cipher_suite: Option<u16>,

    /// Negotiated DTLS-SRTP profile
    pub srtp_crypto_suite: Option<SrtpCryptoSuite>,

    /// Names on the peer chain (index 0 is the peer's own certificate)
    pub peer_chain: Vec<CertInfo>,
}

impl ConnectionInfo {
    pub fn from_ssl(ssl: &SslRef) -> Self {
        let cipher = ssl.current_cipher();

        ConnectionInfo {
            version: ssl.version_str().to_string(),
            cipher: cipher
                .map(|c| c.name().to_string())
                .unwrap_or_else(|| "<undef>".to_string()),
            cipher_suite: cipher.map(|c| u16::from_be_bytes(c.protocol_id())),
            srtp_crypto_suite: negotiated_srtp_suite(ssl),
            peer_chain: peer_chain(ssl),
        }
    }

    /// Names on the certificate at `index` of the peer chain
    pub fn cert(&self, index: usize) -> Option<&CertInfo> {
        self.peer_chain.get(index)
    }
}

pub(crate) fn negotiated_srtp_suite(ssl: &SslRef) -> Option<SrtpCryptoSuite> {
    let profile = ssl.selected_srtp_profile()?;
    SrtpCryptoSuite::from_id(profile.id().as_raw() as u16)
}

fn peer_chain(ssl: &SslRef) -> Vec<CertInfo> {
    let mut chain = Vec::new();

    // On the server side the peer chain excludes the leaf
    let leaf = ssl.peer_certificate();
    if let Some(leaf) = &leaf {
        chain.push(CertInfo::from_x509_ref(leaf));
    }

    if let Some(certs) = ssl.peer_cert_chain() {
        for cert in certs {
            let is_leaf = leaf
                .as_ref()
                .map_or(false, |leaf| leaf.to_der().ok() == cert.to_der().ok());
            if !is_leaf {
                chain.push(CertInfo::from_x509_ref(cert));
            }
        }
    }

    chain
}
