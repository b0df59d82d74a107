//! Badge session: the command surface over one transport.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::config::BadgeConfig;
use crate::constants::{DEFAULT_TIMEOUT_MS, RESET_INTERVAL_MS};
use crate::error::{Error, Result};
use crate::protocol::Command;
use crate::reset::ResetHandshake;
use crate::transport::{SerialTransport, Transport};
use crate::types::{Buttons, Color, Led, RegAddr, SpiMode};

/// A connection to one badge.
///
/// Owns the transport; dropping the session closes it. Only one request is
/// ever in flight, every operation blocks until the response frame is read
/// or the read timeout elapses.
pub struct Badge<T: Transport> {
    transport: T,
    timeout: Duration,
    reset_interval: Duration,
}

impl Badge<SerialTransport> {
    /// Open the configured serial port (or the first one found) and reset the
    /// badge into command mode.
    pub fn open(config: &BadgeConfig) -> Result<Self> {
        let timeout = config.timeout();
        let transport = match config.port.as_deref() {
            Some(port) => SerialTransport::open_with_timeout(port, timeout)?,
            None => SerialTransport::open_any(timeout)?,
        };

        let mut badge = Badge::new(transport)
            .with_timeout(timeout)
            .with_reset_interval(config.reset_interval());
        badge.init()?;
        Ok(badge)
    }
}

impl<T: Transport> Badge<T> {
    pub fn new(transport: T) -> Self {
        Badge {
            transport,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            reset_interval: Duration::from_millis(RESET_INTERVAL_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_reset_interval(mut self, interval: Duration) -> Self {
        self.reset_interval = interval;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Bring the badge to a known state.
    ///
    /// Should be called whenever the badge state is unknown.
    pub fn init(&mut self) -> Result<()> {
        let mut handshake = ResetHandshake::new(self.reset_interval);
        handshake.run(&mut self.transport, self.timeout)?;
        log::info!("Badge reset, command interface ready");
        Ok(())
    }

    /// Transfer data over the badge UART, returns the received bytes.
    pub fn uart_transfer(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.transfer(Command::uart(data))
    }

    /// Clear the display buffer.
    pub fn lcd_clear(&mut self) -> Result<()> {
        self.transfer(Command::LcdClear)?;
        Ok(())
    }

    /// Redraw the display from its buffer.
    pub fn lcd_refresh(&mut self) -> Result<()> {
        self.transfer(Command::LcdRefresh)?;
        Ok(())
    }

    pub fn lcd_pixel(&mut self, x: u8, y: u8, color: Color) -> Result<()> {
        self.transfer(Command::lcd_pixel(x, y, color))?;
        Ok(())
    }

    pub fn lcd_text(&mut self, row: u8, col: u8, text: &str) -> Result<()> {
        self.transfer(Command::lcd_text(row, col, text)?)?;
        Ok(())
    }

    pub fn led_set(&mut self, led: Led, on: bool) -> Result<()> {
        self.transfer(Command::led_set(led, on))?;
        Ok(())
    }

    pub fn led_blink(&mut self, led: Led, period: u8) -> Result<()> {
        self.transfer(Command::led_blink(led, period))?;
        Ok(())
    }

    /// Currently pressed buttons. LEFT is never reported, see [`Buttons`].
    pub fn buttons(&mut self) -> Result<Buttons> {
        let payload = self.transfer(Command::Buttons)?;
        let mask = payload
            .first()
            .copied()
            .ok_or(Error::InvalidFrame("empty buttons response"))?;
        Ok(Buttons::from(mask))
    }

    /// Reconfigure the I2C clock [kHz, 1-400]. The default is 100 kHz.
    pub fn i2c_set_clock_khz(&mut self, khz: u32) -> Result<()> {
        self.transfer(Command::i2c_clock(khz)?)?;
        Ok(())
    }

    /// Read `len` bytes from register `reg_addr` of the 7-bit device `dev_addr`.
    pub fn i2c_read(
        &mut self,
        dev_addr: u8,
        reg_addr: impl Into<RegAddr>,
        len: usize,
    ) -> Result<Vec<u8>> {
        let data = self.transfer(Command::i2c_read(dev_addr, reg_addr, len)?)?;
        if data.len() != len {
            log::warn!(
                "i2c_read: requested {} bytes from 0x{:02x}, got {}",
                len,
                dev_addr,
                data.len()
            );
        }
        Ok(data)
    }

    pub fn i2c_write(
        &mut self,
        dev_addr: u8,
        reg_addr: impl Into<RegAddr>,
        data: &[u8],
    ) -> Result<()> {
        self.transfer(Command::i2c_write(dev_addr, reg_addr, data)?)?;
        Ok(())
    }

    /// Configure the SPI peripheral clock [kHz, 1-60000] and mode.
    pub fn spi_config(&mut self, khz: u32, mode: SpiMode) -> Result<()> {
        self.transfer(Command::spi_config(khz, mode)?)?;
        Ok(())
    }

    /// Full-duplex SPI transfer, returns the bytes clocked in.
    pub fn spi_transfer(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.transfer(Command::spi_transfer(data)?)
    }

    pub fn into_shared(self) -> SharedBadge<T> {
        SharedBadge::new(self)
    }

    fn transfer(&mut self, cmd: Command) -> Result<Vec<u8>> {
        self.transport.transfer(cmd, self.timeout)
    }
}

/// A badge session shared between threads.
///
/// The lock is held for a whole request/response round trip, the protocol has
/// no way to tell interleaved responses apart.
pub struct SharedBadge<T: Transport> {
    inner: Arc<Mutex<Badge<T>>>,
}

impl<T: Transport> Clone for SharedBadge<T> {
    fn clone(&self) -> Self {
        SharedBadge {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> SharedBadge<T> {
    pub fn new(badge: Badge<T>) -> Self {
        SharedBadge {
            inner: Arc::new(Mutex::new(badge)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, Badge<T>> {
        // A panic mid-request leaves no state besides the transport itself
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{i2c, kind, led, status};
    use crate::frame::{self, checksum};
    use crate::transport::mock::MockTransport;
    use std::thread;

    fn badge() -> Badge<MockTransport> {
        Badge::new(MockTransport::new())
            .with_timeout(Duration::ZERO)
            .with_reset_interval(Duration::ZERO)
    }

    #[test]
    fn test_init() {
        let mut badge = badge();
        badge
            .transport
            .queue(&frame::verification_frame(status::RESET));
        badge.init().unwrap();
        assert_eq!(badge.transport().sent, vec![vec![kind::RESET]]);
    }

    #[test]
    fn test_init_failure() {
        let mut badge = badge();
        let result = badge.init();
        assert!(matches!(result, Err(Error::ResetFailure { .. })));
    }

    struct CountingTransport {
        inner: MockTransport,
        drops: Arc<Mutex<usize>>,
    }

    impl Transport for CountingTransport {
        fn send_raw(&mut self, raw: &[u8]) -> Result<()> {
            self.inner.send_raw(raw)
        }

        fn recv_raw(&mut self, len: usize, timeout: Duration) -> Result<Vec<u8>> {
            self.inner.recv_raw(len, timeout)
        }

        fn clear_input(&mut self) -> Result<()> {
            self.inner.clear_input()
        }
    }

    impl Drop for CountingTransport {
        fn drop(&mut self) {
            *self.drops.lock().unwrap() += 1;
        }
    }

    #[test]
    fn test_dropping_session_releases_transport_once() {
        let drops = Arc::new(Mutex::new(0));
        let transport = CountingTransport {
            inner: MockTransport::new(),
            drops: drops.clone(),
        };
        let mut badge = Badge::new(transport)
            .with_timeout(Duration::ZERO)
            .with_reset_interval(Duration::ZERO);
        assert!(badge.init().is_err());
        assert_eq!(*drops.lock().unwrap(), 0);

        drop(badge);
        assert_eq!(*drops.lock().unwrap(), 1);
    }

    #[test]
    fn test_led_set() {
        let mut badge = badge();
        badge.transport.queue_response(status::OK, &[]);
        badge.led_set(Led::Led1, true).unwrap();

        let crc = checksum(&[kind::LED, led::SET, 0, 1]);
        assert_eq!(
            badge.transport().sent,
            vec![vec![4, kind::LED, led::SET, 0, 1, crc]]
        );
    }

    #[test]
    fn test_i2c_read() {
        let mut badge = badge();
        let regs: Vec<u8> = (0..16).collect();
        badge.transport.queue_response(status::OK, &regs);

        let data = badge.i2c_read(0x50, 0x10u8, 16).unwrap();
        assert_eq!(data, regs);

        let sent = &badge.transport().sent[0];
        assert_eq!(&sent[..7], &[6, kind::I2C, i2c::READ, 0x50, 1, 0x10, 16]);
    }

    #[test]
    fn test_i2c_write_too_long_sends_nothing() {
        let mut badge = badge();
        let result = badge.i2c_write(0x50, 0x00u8, &[0u8; 256]);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert_eq!(badge.transport().sent_bytes(), 0);
    }

    #[test]
    fn test_invalid_arguments_send_nothing() {
        let mut badge = badge();
        assert!(badge.i2c_set_clock_khz(0).is_err());
        assert!(badge.i2c_set_clock_khz(401).is_err());
        assert!(badge.spi_config(60001, SpiMode::Mode0).is_err());
        assert!(badge.spi_transfer(&[0u8; 256]).is_err());
        assert!(badge.i2c_read(0x50, 0x1_0000_0000u64, 1).is_err());
        assert!(badge.i2c_read(0x50, 0u8, 256).is_err());
        assert!(badge.lcd_text(0, 0, "\u{2603}").is_err());
        assert_eq!(badge.transport().sent_bytes(), 0);
    }

    #[test]
    fn test_buttons() {
        let mut badge = badge();
        badge
            .transport
            .queue_response(status::OK, &[Buttons::DOWN | Buttons::UP]);
        let buttons = badge.buttons().unwrap();
        assert!(buttons.down());
        assert!(buttons.up());
        assert!(!buttons.right());
        assert_eq!(badge.transport().sent, vec![vec![1, kind::BTN, kind::BTN]]);
    }

    #[test]
    fn test_buttons_empty_payload() {
        let mut badge = badge();
        badge.transport.queue_response(status::OK, &[]);
        assert!(matches!(badge.buttons(), Err(Error::InvalidFrame(_))));
    }

    #[test]
    fn test_uart_and_spi_transfer() {
        let mut badge = badge();
        badge.transport.queue_response(status::OK, b"OK\r\n");
        badge.transport.queue_response(status::OK, &[0xef, 0x40, 0x18]);

        assert_eq!(badge.uart_transfer(b"AT\r\n").unwrap(), b"OK\r\n");
        assert_eq!(
            badge.spi_transfer(&[0x9f, 0, 0]).unwrap(),
            vec![0xef, 0x40, 0x18]
        );
    }

    #[test]
    fn test_device_error_status() {
        let mut badge = badge();
        badge.transport.queue_response(0x42, &[0x01]);
        let result = badge.lcd_clear();
        assert!(matches!(
            result,
            Err(Error::Protocol { status: 0x42, .. })
        ));
    }

    #[test]
    fn test_corrupted_response() {
        let mut badge = badge();
        let mut raw = frame::encode(status::OK, &[0x55]).unwrap();
        *raw.last_mut().unwrap() ^= 0x01;
        badge.transport.queue(&raw);

        let result = badge.lcd_refresh();
        assert!(matches!(result, Err(Error::Checksum { .. })));
    }

    #[test]
    fn test_no_response_times_out() {
        let mut badge = badge();
        let result = badge.lcd_pixel(1, 2, Color::White);
        assert!(matches!(
            result,
            Err(Error::Timeout {
                expected: 1,
                received: 0
            })
        ));
    }

    #[test]
    fn test_truncated_response_times_out() {
        let mut badge = badge();
        badge.transport.queue(&[5, status::OK, 0x01]);
        let result = badge.led_blink(Led::Led2, 50);
        assert!(matches!(
            result,
            Err(Error::Timeout {
                expected: 6,
                received: 2
            })
        ));
    }

    #[test]
    fn test_shared_badge_serializes_requests() {
        let mut badge = badge();
        for _ in 0..8 {
            badge.transport.queue_response(status::OK, &[]);
        }
        let shared = badge.into_shared();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || {
                    let mut badge = shared.lock();
                    badge.led_blink(Led::Led1, i)
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        assert_eq!(shared.lock().transport().sent.len(), 8);
    }
}
