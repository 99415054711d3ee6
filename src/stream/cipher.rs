//! Cipher suite policy
//!
//! The context cipher list rules out NULL/anonymous suites and the larger
//! SHA-2 HMACs; [`is_acceptable_cipher`] states what a finished handshake
//! is expected to have negotiated for each key type.

use crate::identity::KeyType;

/// OpenSSL cipher string applied to every context
pub const DEFAULT_CIPHER_LIST: &str =
    "DEFAULT:!NULL:!aNULL:!SHA256:!SHA384:!aECDH:!AESGCM+AES256:!aPSK";

pub const TLS_NULL_WITH_NULL_NULL: u16 = 0x0000;

/// IANA cipher suite ids and names
const CIPHER_SUITES: &[(u16, &str)] = &[
    (0x002f, "TLS_RSA_WITH_AES_128_CBC_SHA"),
    (0x0035, "TLS_RSA_WITH_AES_256_CBC_SHA"),
    (0x009c, "TLS_RSA_WITH_AES_128_GCM_SHA256"),
    (0x009d, "TLS_RSA_WITH_AES_256_GCM_SHA384"),
    (0xc009, "TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA"),
    (0xc00a, "TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA"),
    (0xc013, "TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA"),
    (0xc014, "TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA"),
    (0xc023, "TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA256"),
    (0xc024, "TLS_ECDHE_ECDSA_WITH_AES_256_CBC_SHA384"),
    (0xc027, "TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA256"),
    (0xc028, "TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA384"),
    (0xc02b, "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256"),
    (0xc02c, "TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384"),
    (0xc02f, "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256"),
    (0xc030, "TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384"),
    (0xcca8, "TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256"),
    (0xcca9, "TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256"),
];

const OK_RSA_CIPHERS: &[u16] = &[0xc013, 0xc014, 0xc02f, 0xcca8];

const OK_ECDSA_CIPHERS: &[u16] = &[0xc009, 0xc00a, 0xc02b, 0xcca9];

/// RFC name of a cipher suite id
pub fn cipher_suite_name(id: u16) -> Option<&'static str> {
    CIPHER_SUITES
        .iter()
        .find(|(suite, _)| *suite == id)
        .map(|(_, name)| *name)
}

/// Cipher suite id for an RFC name
pub fn cipher_suite_id(name: &str) -> Option<u16> {
    CIPHER_SUITES
        .iter()
        .find(|(_, suite)| *suite == name)
        .map(|(id, _)| *id)
}

/// Whether a negotiated suite is one we expect for an identity of `key_type`
pub fn is_acceptable_cipher(id: u16, key_type: KeyType) -> bool {
    match key_type {
        KeyType::Rsa => OK_RSA_CIPHERS.contains(&id),
        KeyType::Ecdsa => OK_ECDSA_CIPHERS.contains(&id),
    }
}

/// Name-based variant of [`is_acceptable_cipher`]
pub fn is_acceptable_cipher_name(name: &str, key_type: KeyType) -> bool {
    cipher_suite_id(name).map_or(false, |id| is_acceptable_cipher(id, key_type))
}
