pub const BAUDRATE: u32 = 115200;
pub const DEFAULT_TIMEOUT_MS: u64 = 500;
pub const RESET_INTERVAL_MS: u64 = 100;
pub const RESET_MAX_ATTEMPTS: usize = 256;

/// Largest body (type byte + data) a single length byte can describe.
pub const MAX_FRAME_BODY: usize = 255;
pub const MAX_REG_ADDR_LEN: usize = 4;

pub const LCD_WIDTH: u8 = 128;
pub const LCD_HEIGHT: u8 = 64;
pub const LCD_TEXT_ROWS: u8 = 8;

/// Command type bytes, selecting the peripheral group.
pub mod kind {
    pub const RESET: u8 = 0x00;
    pub const UART: u8 = 0x01;
    pub const LCD: u8 = 0x02;
    pub const LED: u8 = 0x03;
    pub const BTN: u8 = 0x04;
    pub const I2C: u8 = 0x05;
    pub const SPI: u8 = 0x06;
}

pub mod lcd {
    pub const CLEAR: u8 = 0x00;
    pub const REFRESH: u8 = 0x01;
    pub const PIXEL: u8 = 0x02;
    pub const TEXT: u8 = 0x03;
}

pub mod led {
    pub const SET: u8 = 0x00;
    pub const BLINK: u8 = 0x01;
}

pub mod i2c {
    pub const CLOCK: u8 = 0x00;
    pub const READ: u8 = 0x01;
    pub const WRITE: u8 = 0x02;
}

pub mod spi {
    pub const CONFIG: u8 = 0x00;
    pub const TRANSFER: u8 = 0x01;
}

/// Response status bytes.
pub mod status {
    pub const OK: u8 = 0x80;
    pub const RESET: u8 = 0x81;
}
