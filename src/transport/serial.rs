//! Serial Transportation.
use std::{
    io::{ErrorKind, Read, Write},
    time::{Duration, Instant},
};

use serialport::{ClearBuffer, SerialPort};

use super::Transport;
use crate::constants::{BAUDRATE, DEFAULT_TIMEOUT_MS};
use crate::error::{Error, Result};

pub struct SerialTransport {
    serial_port: Box<dyn SerialPort>,
    port_name: String,
}

impl SerialTransport {
    pub fn scan_ports() -> Result<Vec<String>> {
        let ports = serialport::available_ports()?;
        Ok(ports.into_iter().map(|p| p.port_name).collect())
    }

    pub fn open(port: &str) -> Result<Self> {
        Self::open_with_timeout(port, Duration::from_millis(DEFAULT_TIMEOUT_MS))
    }

    pub fn open_with_timeout(port: &str, timeout: Duration) -> Result<Self> {
        log::info!("Opening serial port: \"{}\" @ {} baud", port, BAUDRATE);
        let serial_port = serialport::new(port, BAUDRATE).timeout(timeout).open()?;
        Ok(SerialTransport {
            serial_port,
            port_name: port.to_string(),
        })
    }

    pub fn open_nth(nth: usize, timeout: Duration) -> Result<Self> {
        let ports = serialport::available_ports()?;

        match ports.get(nth) {
            Some(port) => Self::open_with_timeout(&port.port_name, timeout),
            None => Err(Error::Serial(serialport::Error::new(
                serialport::ErrorKind::NoDevice,
                format!("No serial port found at index #{}", nth),
            ))),
        }
    }

    pub fn open_any(timeout: Duration) -> Result<Self> {
        Self::open_nth(0, timeout)
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl Transport for SerialTransport {
    fn send_raw(&mut self, raw: &[u8]) -> Result<()> {
        self.serial_port.write_all(raw)?;
        self.serial_port.flush()?;
        Ok(())
    }

    /// Reads up to `len` bytes. `timeout` bounds the whole call, not each chunk.
    fn recv_raw(&mut self, len: usize, timeout: Duration) -> Result<Vec<u8>> {
        let deadline = Instant::now() + timeout;

        let mut buf = vec![0u8; len];
        let mut filled = 0;
        while filled < len {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            if self.serial_port.timeout() != remaining {
                self.serial_port.set_timeout(remaining)?;
            }
            match self.serial_port.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::TimedOut => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        buf.truncate(filled);
        Ok(buf)
    }

    fn clear_input(&mut self) -> Result<()> {
        self.serial_port.clear(ClearBuffer::Input)?;
        Ok(())
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        log::debug!("Closing serial port: \"{}\"", self.port_name);
    }
}
