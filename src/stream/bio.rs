//! `io::Read`/`io::Write` view of a shared transport
//!
//! OpenSSL drives its record layer through a BIO built over any
//! `Read + Write` type. Blocking transport results become `WouldBlock`,
//! which OpenSSL reports back as WANT_READ / WANT_WRITE.

use crate::transport::{StreamResult, Transport};
use parking_lot::Mutex;
use std::io::{self, Read, Write};
use std::sync::Arc;

/// Transport failure code carried inside an `io::Error`
#[derive(Debug, thiserror::Error)]
#[error("transport error {0}")]
pub(crate) struct TransportFailure(pub i32);

/// Recover the transport code from an I/O error raised by [`TransportIo`]
pub(crate) fn transport_code(err: &io::Error) -> Option<i32> {
    err.get_ref()
        .and_then(|inner| inner.downcast_ref::<TransportFailure>())
        .map(|failure| failure.0)
}

pub(crate) struct TransportIo<T> {
    transport: Arc<Mutex<T>>,
}

impl<T> TransportIo<T> {
    pub(crate) fn new(transport: Arc<Mutex<T>>) -> Self {
        TransportIo { transport }
    }
}

fn result_to_io(result: StreamResult, eos: io::Result<usize>) -> io::Result<usize> {
    match result {
        StreamResult::Success(n) => Ok(n),
        StreamResult::Block => Err(io::ErrorKind::WouldBlock.into()),
        StreamResult::Eos => eos,
        StreamResult::Error(code) => Err(io::Error::new(
            io::ErrorKind::Other,
            TransportFailure(code),
        )),
    }
}

impl<T: Transport> Read for TransportIo<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let result = self.transport.lock().read(buf);
        result_to_io(result, Ok(0))
    }
}

impl<T: Transport> Write for TransportIo<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let result = self.transport.lock().write(buf);
        result_to_io(result, Err(io::ErrorKind::BrokenPipe.into()))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
