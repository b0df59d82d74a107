//! Frame codec.
//!
//! Every command travels as `[length][type][data...][checksum]`, where `length`
//! counts the type byte and data, and the checksum is the XOR of the same bytes.
//! Responses share the layout with a status byte in place of the type byte.

use crate::constants::MAX_FRAME_BODY;
use crate::error::{Error, Result};

/// XOR-fold checksum, usable on a byte slice or a single byte.
pub trait Checksum {
    fn checksum(&self) -> u8;
}

impl Checksum for u8 {
    fn checksum(&self) -> u8 {
        *self
    }
}

impl Checksum for [u8] {
    fn checksum(&self) -> u8 {
        self.iter().fold(0u8, |acc, &b| acc ^ b)
    }
}

impl<const N: usize> Checksum for [u8; N] {
    fn checksum(&self) -> u8 {
        self[..].checksum()
    }
}

pub fn checksum<C: Checksum + ?Sized>(data: &C) -> u8 {
    data.checksum()
}

/// Build a command frame for `kind` carrying `data` (opcode first, if any).
pub fn encode(kind: u8, data: &[u8]) -> Result<Vec<u8>> {
    let body_len = 1 + data.len();
    if body_len > MAX_FRAME_BODY {
        return Err(Error::invalid(format!(
            "frame body is {} bytes, at most {} fit the length byte",
            body_len, MAX_FRAME_BODY
        )));
    }

    let mut buf = Vec::with_capacity(body_len + 2);
    buf.push(body_len as u8);
    buf.push(kind);
    buf.extend_from_slice(data);
    buf.push(buf[1..].checksum());
    Ok(buf)
}

/// The exact frame a device sends when it replies with a bare `status`.
pub fn verification_frame(status: u8) -> [u8; 3] {
    [1, status, status.checksum()]
}

/// Split a received frame body (`status`, payload, checksum) after the length
/// byte, checking the checksum. Returns the status and payload.
pub fn decode_body(raw: &[u8]) -> Result<(u8, &[u8])> {
    let Some((&received, checked)) = raw.split_last() else {
        return Err(Error::InvalidFrame("missing checksum"));
    };
    let Some((&status, payload)) = checked.split_first() else {
        return Err(Error::InvalidFrame("missing status byte"));
    };

    let expected = checked.checksum();
    if expected != received {
        return Err(Error::Checksum { expected, received });
    }
    Ok((status, payload))
}
