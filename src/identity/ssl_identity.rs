//! Key pair plus self-signed certificate

use super::certificate::SslCertificate;
use super::key_params::{EcCurve, KeyParams, KeyType, RsaParams, SslIdentityParams};
use crate::error::{Result, SslError};
use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{Id, PKey, PKeyRef, Private};
use openssl::rsa::Rsa;
use openssl::x509::{X509NameBuilder, X509};
use std::fmt;
use tracing::debug;

/// Backdating applied to `not_before` to tolerate peer clock skew
const CERTIFICATE_WINDOW_SECS: i64 = 86400;

/// Random serial number width
const SERIAL_BITS: i32 = 64;

/// One key pair and the certificate carrying its public half
#[derive(Clone)]
pub struct SslIdentity {
    key_pair: PKey<Private>,
    certificate: SslCertificate,
}

impl SslIdentity {
    /// Generate an identity valid from one day ago until `lifetime` seconds
    /// from now
    pub fn generate(common_name: &str, key_params: &KeyParams, lifetime: i64) -> Result<Self> {
        let now = chrono::Utc::now().timestamp();
        let not_after = now.checked_add(lifetime).ok_or_else(|| {
            SslError::Configuration(format!("certificate lifetime {} out of range", lifetime))
        })?;
        Self::generate_with_expiration(
            common_name,
            key_params,
            now - CERTIFICATE_WINDOW_SECS,
            not_after,
        )
    }

    /// Generate an identity with an explicit validity window (seconds since
    /// the epoch)
    pub fn generate_with_expiration(
        common_name: &str,
        key_params: &KeyParams,
        not_before: i64,
        not_after: i64,
    ) -> Result<Self> {
        Self::generate_from_params(&SslIdentityParams {
            common_name: common_name.to_string(),
            not_before,
            not_after,
            key_params: *key_params,
        })
    }

    pub fn generate_from_params(params: &SslIdentityParams) -> Result<Self> {
        if !params.key_params.is_valid() {
            return Err(SslError::Configuration(format!(
                "invalid key parameters {:?}",
                params.key_params
            )));
        }
        if params.not_before > params.not_after {
            return Err(SslError::Configuration(format!(
                "not_before {} is after not_after {}",
                params.not_before, params.not_after
            )));
        }

        let key_pair = make_key(&params.key_params)?;
        let x509 = make_certificate(&key_pair, params)?;
        debug!(
            "Generated {:?} identity for '{}'",
            params.key_params.key_type(),
            params.common_name
        );

        Ok(SslIdentity {
            key_pair,
            certificate: SslCertificate::from_x509(x509),
        })
    }

    /// Load an identity from PEM text. The key must match the certificate.
    pub fn from_pem_strings(private_key: &str, certificate: &str) -> Result<Self> {
        let key_pair = PKey::private_key_from_pem(private_key.as_bytes())
            .map_err(|e| SslError::MalformedInput(format!("bad private key: {}", e)))?;
        let certificate = SslCertificate::from_pem_string(certificate)?;

        let public_key = certificate.x509().public_key()?;
        if !key_pair.public_eq(&public_key) {
            return Err(SslError::Configuration(
                "private key does not match certificate".to_string(),
            ));
        }

        Ok(SslIdentity {
            key_pair,
            certificate,
        })
    }

    pub fn certificate(&self) -> &SslCertificate {
        &self.certificate
    }

    pub(crate) fn key_pair(&self) -> &PKeyRef<Private> {
        &self.key_pair
    }

    pub fn key_type(&self) -> Option<KeyType> {
        match self.key_pair.id() {
            Id::RSA => Some(KeyType::Rsa),
            Id::EC => Some(KeyType::Ecdsa),
            _ => None,
        }
    }

    /// PKCS#8 `PRIVATE KEY` block
    pub fn private_key_to_pem_string(&self) -> Result<String> {
        pem_string(self.key_pair.private_key_to_pem_pkcs8()?)
    }

    /// SubjectPublicKeyInfo `PUBLIC KEY` block
    pub fn public_key_to_pem_string(&self) -> Result<String> {
        pem_string(self.key_pair.public_key_to_pem()?)
    }
}

impl PartialEq for SslIdentity {
    fn eq(&self, other: &Self) -> bool {
        let same_key = match (
            self.key_pair.private_key_to_der(),
            other.key_pair.private_key_to_der(),
        ) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        };
        same_key && self.certificate == other.certificate
    }
}

impl Eq for SslIdentity {}

impl fmt::Debug for SslIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SslIdentity")
            .field("key_type", &self.key_type())
            .field("subject", &self.certificate.info().subject)
            .finish()
    }
}

fn pem_string(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| SslError::MalformedInput(e.to_string()))
}

fn make_key(params: &KeyParams) -> Result<PKey<Private>> {
    match params {
        KeyParams::Rsa(RsaParams { mod_size, pub_exp }) => {
            let exponent = BigNum::from_u32(*pub_exp)?;
            let rsa = Rsa::generate_with_e(*mod_size, &exponent)?;
            Ok(PKey::from_rsa(rsa)?)
        }
        KeyParams::Ecdsa(EcCurve::NistP256) => {
            let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1)?;
            let ec_key = EcKey::generate(&group)?;
            Ok(PKey::from_ec_key(ec_key)?)
        }
    }
}

fn make_certificate(key_pair: &PKeyRef<Private>, params: &SslIdentityParams) -> Result<X509> {
    let mut builder = X509::builder()?;
    // X.509 v3
    builder.set_version(2)?;

    let mut serial = BigNum::new()?;
    serial.rand(SERIAL_BITS, MsbOption::MAYBE_ZERO, false)?;
    let serial = serial.to_asn1_integer()?;
    builder.set_serial_number(&serial)?;

    let mut name = X509NameBuilder::new()?;
    name.append_entry_by_nid(Nid::COMMONNAME, &params.common_name)?;
    let name = name.build();
    builder.set_subject_name(&name)?;
    builder.set_issuer_name(&name)?;

    builder.set_pubkey(key_pair)?;
    let not_before = Asn1Time::from_unix(params.not_before as libc::time_t)?;
    let not_after = Asn1Time::from_unix(params.not_after as libc::time_t)?;
    builder.set_not_before(&not_before)?;
    builder.set_not_after(&not_after)?;
    builder.sign(key_pair, MessageDigest::sha256())?;

    Ok(builder.build())
}
