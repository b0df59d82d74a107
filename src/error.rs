//! Error types for badge protocol operations

use thiserror::Error;

/// Badge protocol errors
#[derive(Debug, Error)]
pub enum Error {
    /// Caller supplied a value the device cannot accept, detected before any I/O
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Received checksum does not match the one computed over the frame
    #[error("CRC error (expected 0x{expected:02x}, got 0x{received:02x})")]
    Checksum { expected: u8, received: u8 },

    /// Device answered with a status other than OK
    #[error("Response != OK: response = 0x{status:02x}, data = \"{}\"", hex::encode(.payload))]
    Protocol { status: u8, payload: Vec<u8> },

    /// Fewer bytes than requested arrived before the read timeout
    #[error("Timeout: expected {expected} bytes, received {received}")]
    Timeout { expected: usize, received: usize },

    /// Reset handshake exhausted its retry budget
    #[error("No response after reset ({attempts} attempts)")]
    ResetFailure { attempts: usize },

    /// Response frame is structurally unusable
    #[error("Invalid response frame: {0}")]
    InvalidFrame(&'static str),

    /// Field serialization failed
    #[error("Encode error: {0}")]
    Encode(#[from] scroll::Error),

    /// I/O error during communication
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port error
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}

/// Result type for badge operations
pub type Result<T> = core::result::Result<T, Error>;
