//! Error types shared by the identity model and the secure session

use crate::stream::SslStateKind;

/// Secure transport errors
#[derive(Debug, thiserror::Error)]
pub enum SslError {
    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("{operation} is not allowed in state {state:?}")]
    InvalidState {
        operation: &'static str,
        state: SslStateKind,
    },

    #[error("Transport error: {0}")]
    Transport(i32),

    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("Certificate verification failed: {0}")]
    Verification(String),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),
}

impl SslError {
    /// Numeric code reported through close notifications.
    ///
    /// Transport errors keep the transport's own code; everything else
    /// collapses to -1.
    pub fn code(&self) -> i32 {
        match self {
            SslError::Transport(code) => *code,
            _ => -1,
        }
    }
}

/// Result type for secure transport operations
pub type Result<T> = std::result::Result<T, SslError>;
