//! Digest algorithm names
//!
//! Names follow the IANA "Hash Function Textual Names" registry used in SDP
//! `a=fingerprint` lines.

use crate::error::{Result, SslError};
use openssl::hash::{hash, MessageDigest};
use openssl::nid::Nid;

pub const DIGEST_MD5: &str = "md5";
pub const DIGEST_SHA_1: &str = "sha-1";
pub const DIGEST_SHA_224: &str = "sha-224";
pub const DIGEST_SHA_256: &str = "sha-256";
pub const DIGEST_SHA_384: &str = "sha-384";
pub const DIGEST_SHA_512: &str = "sha-512";

/// Largest digest any supported algorithm produces
pub const MAX_DIGEST_SIZE: usize = 64;

/// Look up the OpenSSL digest for an algorithm name
pub fn message_digest(algorithm: &str) -> Option<MessageDigest> {
    match algorithm {
        DIGEST_MD5 => Some(MessageDigest::md5()),
        DIGEST_SHA_1 => Some(MessageDigest::sha1()),
        DIGEST_SHA_224 => Some(MessageDigest::sha224()),
        DIGEST_SHA_256 => Some(MessageDigest::sha256()),
        DIGEST_SHA_384 => Some(MessageDigest::sha384()),
        DIGEST_SHA_512 => Some(MessageDigest::sha512()),
        _ => None,
    }
}

/// Output size in bytes of the named digest
pub fn digest_size(algorithm: &str) -> Option<usize> {
    message_digest(algorithm).map(|md| md.size())
}

/// Algorithms allowed in RFC 4572 fingerprints (the SHA family)
pub fn is_fips180_digest_algorithm(algorithm: &str) -> bool {
    matches!(
        algorithm,
        DIGEST_SHA_1 | DIGEST_SHA_224 | DIGEST_SHA_256 | DIGEST_SHA_384 | DIGEST_SHA_512
    )
}

/// Map a digest NID back to its algorithm name
pub fn digest_algorithm_for_nid(nid: Nid) -> Option<&'static str> {
    match nid {
        Nid::MD5 => Some(DIGEST_MD5),
        Nid::SHA1 => Some(DIGEST_SHA_1),
        Nid::SHA224 => Some(DIGEST_SHA_224),
        Nid::SHA256 => Some(DIGEST_SHA_256),
        Nid::SHA384 => Some(DIGEST_SHA_384),
        Nid::SHA512 => Some(DIGEST_SHA_512),
        _ => None,
    }
}

/// Digest `data` with the named algorithm
pub fn compute_digest(algorithm: &str, data: &[u8]) -> Result<Vec<u8>> {
    let md = message_digest(algorithm)
        .ok_or_else(|| SslError::UnsupportedAlgorithm(algorithm.to_string()))?;
    Ok(hash(md, data)?.to_vec())
}
