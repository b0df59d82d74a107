//! Abstract Device transport interface.
use std::time::Duration;

use crate::error::{Error, Result};
use crate::protocol::{Command, Response};

pub use self::serial::SerialTransport;

#[cfg(test)]
pub(crate) mod mock;
mod serial;

/// Abstraction of the transport layer.
/// A serial port on real hardware, anything byte-oriented otherwise.
pub trait Transport {
    fn send_raw(&mut self, raw: &[u8]) -> Result<()>;

    /// Read up to `len` bytes, returning fewer if `timeout` elapses first.
    fn recv_raw(&mut self, len: usize, timeout: Duration) -> Result<Vec<u8>>;

    /// Discard anything already buffered on the receive side.
    fn clear_input(&mut self) -> Result<()>;

    fn recv_exact(&mut self, len: usize, timeout: Duration) -> Result<Vec<u8>> {
        let buf = self.recv_raw(len, timeout)?;
        if buf.len() < len {
            return Err(Error::Timeout {
                expected: len,
                received: buf.len(),
            });
        }
        Ok(buf)
    }

    /// Read one response frame; the length byte sizes the rest of the read.
    fn recv_response(&mut self, timeout: Duration) -> Result<Response> {
        let len = self.recv_exact(1, timeout)?[0];
        let raw = self.recv_exact(len as usize + 1, timeout)?;
        log::debug!("<= {:02x}{}", len, hex::encode(&raw));
        Response::from_raw(&raw)
    }

    fn transfer(&mut self, cmd: Command, timeout: Duration) -> Result<Vec<u8>> {
        let req = &cmd.into_raw()?;
        log::debug!("=> {}", hex::encode(req));
        self.send_raw(req)?;

        let resp = self.recv_response(timeout)?;
        if !resp.is_ok() {
            log::debug!("device reported {:?}", resp);
        }
        resp.into_payload()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send_raw(&mut self, raw: &[u8]) -> Result<()> {
        (**self).send_raw(raw)
    }

    fn recv_raw(&mut self, len: usize, timeout: Duration) -> Result<Vec<u8>> {
        (**self).recv_raw(len, timeout)
    }

    fn clear_input(&mut self) -> Result<()> {
        (**self).clear_input()
    }
}
