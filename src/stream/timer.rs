//! DTLS retransmission timer
//!
//! OpenSSL keeps the handshake retransmit deadline internally but only
//! exposes it through `SSL_ctrl`. The session polls it after every stalled
//! step and hands the deadline to its owner through `poll_timeout`.

use foreign_types::ForeignTypeRef;
use openssl::ssl::SslRef;
use std::os::raw::{c_int, c_void};
use std::ptr;
use std::time::{Duration, Instant};

const DTLS_CTRL_GET_TIMEOUT: c_int = 73;
const DTLS_CTRL_HANDLE_TIMEOUT: c_int = 74;

/// Time left until OpenSSL wants to retransmit, if a flight is outstanding
pub(crate) fn dtls_get_timeout(ssl: &SslRef) -> Option<Duration> {
    let mut tv = libc::timeval {
        tv_sec: 0,
        tv_usec: 0,
    };
    let ret = unsafe {
        openssl_sys::SSL_ctrl(
            ssl.as_ptr(),
            DTLS_CTRL_GET_TIMEOUT,
            0,
            &mut tv as *mut libc::timeval as *mut c_void,
        )
    };
    if ret <= 0 {
        return None;
    }
    Some(Duration::from_secs(tv.tv_sec as u64) + Duration::from_micros(tv.tv_usec as u64))
}

/// Let OpenSSL retransmit its last flight. Returns false if nothing was due.
pub(crate) fn dtls_handle_timeout(ssl: &SslRef) -> bool {
    let ret = unsafe {
        openssl_sys::SSL_ctrl(ssl.as_ptr(), DTLS_CTRL_HANDLE_TIMEOUT, 0, ptr::null_mut())
    };
    ret > 0
}

/// Single pending deadline
#[derive(Debug, Default)]
pub(crate) struct RetransmitTimer {
    deadline: Option<Instant>,
}

impl RetransmitTimer {
    pub(crate) fn arm(&mut self, now: Instant, delay: Duration) {
        self.deadline = Some(now + delay);
    }

    pub(crate) fn clear(&mut self) {
        self.deadline = None;
    }

    pub(crate) fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True (and cleared) if the deadline has passed
    pub(crate) fn take_expired(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
