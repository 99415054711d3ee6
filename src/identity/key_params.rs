//! Key generation parameters

/// Smallest RSA modulus accepted for generation
pub const RSA_MIN_MOD_SIZE: u32 = 1024;
/// Largest RSA modulus accepted for generation
pub const RSA_MAX_MOD_SIZE: u32 = 8192;
/// Default RSA modulus size
pub const RSA_DEFAULT_MOD_SIZE: u32 = 2048;
/// Default RSA public exponent (F4)
pub const RSA_DEFAULT_EXPONENT: u32 = 0x10001;

/// Kind of key pair backing an identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    Rsa,
    Ecdsa,
}

/// Elliptic curves supported for ECDSA keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EcCurve {
    /// NIST P-256 (prime256v1)
    NistP256,
}

/// RSA key parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RsaParams {
    /// Modulus size in bits
    pub mod_size: u32,
    /// Public exponent
    pub pub_exp: u32,
}

impl Default for RsaParams {
    fn default() -> Self {
        RsaParams {
            mod_size: RSA_DEFAULT_MOD_SIZE,
            pub_exp: RSA_DEFAULT_EXPONENT,
        }
    }
}

/// Parameters for generating a key pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyParams {
    Rsa(RsaParams),
    Ecdsa(EcCurve),
}

impl Default for KeyParams {
    fn default() -> Self {
        KeyParams::Ecdsa(EcCurve::NistP256)
    }
}

impl From<KeyType> for KeyParams {
    fn from(key_type: KeyType) -> Self {
        match key_type {
            KeyType::Rsa => KeyParams::Rsa(RsaParams::default()),
            KeyType::Ecdsa => KeyParams::Ecdsa(EcCurve::NistP256),
        }
    }
}

impl KeyParams {
    /// RSA parameters with an explicit modulus size and exponent
    pub fn rsa(mod_size: u32, pub_exp: u32) -> Self {
        KeyParams::Rsa(RsaParams { mod_size, pub_exp })
    }

    /// ECDSA parameters on the given curve
    pub fn ecdsa(curve: EcCurve) -> Self {
        KeyParams::Ecdsa(curve)
    }

    pub fn key_type(&self) -> KeyType {
        match self {
            KeyParams::Rsa(_) => KeyType::Rsa,
            KeyParams::Ecdsa(_) => KeyType::Ecdsa,
        }
    }

    pub fn rsa_params(&self) -> Option<RsaParams> {
        match self {
            KeyParams::Rsa(params) => Some(*params),
            KeyParams::Ecdsa(_) => None,
        }
    }

    pub fn ec_curve(&self) -> Option<EcCurve> {
        match self {
            KeyParams::Ecdsa(curve) => Some(*curve),
            KeyParams::Rsa(_) => None,
        }
    }

    /// Check whether these parameters can be used for key generation.
    ///
    /// RSA needs a modulus in `[1024, 8192]` bits and an exponent larger
    /// than the modulus size; ECDSA needs a supported curve.
    pub fn is_valid(&self) -> bool {
        match self {
            KeyParams::Rsa(RsaParams { mod_size, pub_exp }) => {
                (RSA_MIN_MOD_SIZE..=RSA_MAX_MOD_SIZE).contains(mod_size) && pub_exp > mod_size
            }
            KeyParams::Ecdsa(EcCurve::NistP256) => true,
        }
    }
}

/// Parameters for generating a self-signed identity
///
/// Used only at generation time; nothing keeps them afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SslIdentityParams {
    pub common_name: String,
    /// Seconds since the epoch
    pub not_before: i64,
    /// Seconds since the epoch
    pub not_after: i64,
    pub key_params: KeyParams,
}
