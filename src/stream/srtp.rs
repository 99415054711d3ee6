//! DTLS-SRTP protection profiles (RFC 5764)

use crate::error::SslError;

pub const CS_AES_CM_128_HMAC_SHA1_80: &str = "AES_CM_128_HMAC_SHA1_80";
pub const CS_AES_CM_128_HMAC_SHA1_32: &str = "AES_CM_128_HMAC_SHA1_32";

/// SRTP crypto suite negotiated through the use_srtp extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SrtpCryptoSuite {
    /// AES-128 counter mode, 80-bit HMAC-SHA1 tag
    AesCm128HmacSha1_80,
    /// AES-128 counter mode, 32-bit HMAC-SHA1 tag
    AesCm128HmacSha1_32,
}

impl SrtpCryptoSuite {
    /// IANA DTLS-SRTP protection profile id
    pub fn id(&self) -> u16 {
        match self {
            SrtpCryptoSuite::AesCm128HmacSha1_80 => 0x0001,
            SrtpCryptoSuite::AesCm128HmacSha1_32 => 0x0002,
        }
    }

    pub fn from_id(id: u16) -> Option<Self> {
        match id {
            0x0001 => Some(SrtpCryptoSuite::AesCm128HmacSha1_80),
            0x0002 => Some(SrtpCryptoSuite::AesCm128HmacSha1_32),
            _ => None,
        }
    }

    /// SDES/SDP name
    pub fn name(&self) -> &'static str {
        match self {
            SrtpCryptoSuite::AesCm128HmacSha1_80 => CS_AES_CM_128_HMAC_SHA1_80,
            SrtpCryptoSuite::AesCm128HmacSha1_32 => CS_AES_CM_128_HMAC_SHA1_32,
        }
    }

    pub fn from_name(name: &str) -> Result<Self, SslError> {
        match name {
            CS_AES_CM_128_HMAC_SHA1_80 => Ok(SrtpCryptoSuite::AesCm128HmacSha1_80),
            CS_AES_CM_128_HMAC_SHA1_32 => Ok(SrtpCryptoSuite::AesCm128HmacSha1_32),
            _ => Err(SslError::UnsupportedAlgorithm(name.to_string())),
        }
    }

    /// OpenSSL profile name used in the use_srtp extension
    pub fn openssl_name(&self) -> &'static str {
        match self {
            SrtpCryptoSuite::AesCm128HmacSha1_80 => "SRTP_AES128_CM_SHA1_80",
            SrtpCryptoSuite::AesCm128HmacSha1_32 => "SRTP_AES128_CM_SHA1_32",
        }
    }
}

/// Colon-separated OpenSSL profile list, in offer order
pub(crate) fn srtp_profile_list(suites: &[SrtpCryptoSuite]) -> String {
    suites
        .iter()
        .map(SrtpCryptoSuite::openssl_name)
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_and_ids() {
        for suite in [SrtpCryptoSuite::AesCm128HmacSha1_80, SrtpCryptoSuite::AesCm128HmacSha1_32] {
            assert_eq!(SrtpCryptoSuite::from_name(suite.name()).unwrap(), suite);
            assert_eq!(SrtpCryptoSuite::from_id(suite.id()), Some(suite));
        }
        assert!(SrtpCryptoSuite::from_name("AES_CM_256_HMAC_SHA1_80").is_err());
        assert_eq!(SrtpCryptoSuite::from_id(7), None);
    }

    #[test]
    fn test_profile_list() {
        let list = srtp_profile_list(&[
            SrtpCryptoSuite::AesCm128HmacSha1_32,
            SrtpCryptoSuite::AesCm128HmacSha1_80,
        ]);
        assert_eq!(list, "SRTP_AES128_CM_SHA1_32:SRTP_AES128_CM_SHA1_80");
    }
}
