//! Certificate generation off the calling thread
//!
//! Key generation (RSA in particular) is slow enough that it should not run
//! on the signaling thread. [`RtcCertificateGenerator`] runs it on a worker
//! queue and hands the result back on the origin queue.

pub mod task_queue;

pub use task_queue::TaskQueue;

use crate::error::{Result, SslError};
use crate::identity::{KeyParams, RtcCertificate, SslIdentity};
use tracing::{debug, info};

/// Common name put on every generated certificate
pub const CERTIFICATE_COMMON_NAME: &str = "WebRTC";

/// Lifetime used when the caller does not ask for one
pub const DEFAULT_CERTIFICATE_LIFETIME_SECS: i64 = 60 * 60 * 24 * 30;

/// Upper bound on any requested lifetime
pub const MAX_CERTIFICATE_LIFETIME_SECS: i64 = 60 * 60 * 24 * 365;

/// Produces [`RtcCertificate`]s on a worker queue
#[derive(Debug, Clone)]
pub struct RtcCertificateGenerator {
    origin: TaskQueue,
    worker: TaskQueue,
}

impl RtcCertificateGenerator {
    /// Results of async requests are delivered on `origin`; generation runs
    /// on `worker`
    pub fn new(origin: TaskQueue, worker: TaskQueue) -> Self {
        RtcCertificateGenerator { origin, worker }
    }

    /// Generate a certificate on the calling thread.
    ///
    /// `expires_ms` is the requested lifetime in milliseconds, capped at one
    /// year. Without it the certificate lives for 30 days.
    pub fn generate_certificate(
        key_params: &KeyParams,
        expires_ms: Option<u64>,
    ) -> Result<RtcCertificate> {
        if !key_params.is_valid() {
            return Err(SslError::Configuration(format!(
                "invalid key parameters: {:?}",
                key_params
            )));
        }

        let lifetime = match expires_ms {
            None => DEFAULT_CERTIFICATE_LIFETIME_SECS,
            Some(ms) => {
                let secs = i64::try_from(ms / 1000).unwrap_or(i64::MAX);
                secs.min(MAX_CERTIFICATE_LIFETIME_SECS)
            }
        };

        debug!(key_type = ?key_params.key_type(), lifetime, "Generating certificate");
        let identity = SslIdentity::generate(CERTIFICATE_COMMON_NAME, key_params, lifetime)?;
        Ok(RtcCertificate::create(identity))
    }

    /// Generate on the worker queue and call `callback` on the origin queue.
    ///
    /// The callback runs exactly once, also when the generator itself has
    /// been dropped in the meantime.
    pub fn generate_certificate_async<F>(
        &self,
        key_params: KeyParams,
        expires_ms: Option<u64>,
        callback: F,
    ) where
        F: FnOnce(Result<RtcCertificate>) + Send + 'static,
    {
        let origin = self.origin.clone();
        self.worker.post(move || {
            let result = Self::generate_certificate(&key_params, expires_ms);
            match &result {
                Ok(_) => info!("Certificate generated"),
                Err(e) => info!("Certificate generation failed: {}", e),
            }
            origin.post(move || callback(result));
        });
    }
}
