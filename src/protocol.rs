//! The badge command set on top of the frame codec

use std::fmt;

use scroll::Pwrite;

use crate::constants::{i2c, kind, lcd, led, spi, status};
use crate::error::{Error, Result};
use crate::frame;
use crate::types::{Color, Led, RegAddr, SpiMode};

/// Logical command catalog: which type byte and opcode select each command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommandKind {
    Reset,
    Uart,
    LcdClear,
    LcdRefresh,
    LcdPixel,
    LcdText,
    LedSet,
    LedBlink,
    Buttons,
    I2cClock,
    I2cRead,
    I2cWrite,
    SpiConfig,
    SpiTransfer,
}

impl CommandKind {
    pub const ALL: [CommandKind; 14] = [
        CommandKind::Reset,
        CommandKind::Uart,
        CommandKind::LcdClear,
        CommandKind::LcdRefresh,
        CommandKind::LcdPixel,
        CommandKind::LcdText,
        CommandKind::LedSet,
        CommandKind::LedBlink,
        CommandKind::Buttons,
        CommandKind::I2cClock,
        CommandKind::I2cRead,
        CommandKind::I2cWrite,
        CommandKind::SpiConfig,
        CommandKind::SpiTransfer,
    ];

    /// Type byte of the peripheral group
    pub const fn group(self) -> u8 {
        match self {
            CommandKind::Reset => kind::RESET,
            CommandKind::Uart => kind::UART,
            CommandKind::LcdClear
            | CommandKind::LcdRefresh
            | CommandKind::LcdPixel
            | CommandKind::LcdText => kind::LCD,
            CommandKind::LedSet | CommandKind::LedBlink => kind::LED,
            CommandKind::Buttons => kind::BTN,
            CommandKind::I2cClock | CommandKind::I2cRead | CommandKind::I2cWrite => kind::I2C,
            CommandKind::SpiConfig | CommandKind::SpiTransfer => kind::SPI,
        }
    }

    /// Opcode within the group. Reset, UART and buttons are selected by the
    /// type byte alone.
    pub const fn opcode(self) -> Option<u8> {
        match self {
            CommandKind::Reset | CommandKind::Uart | CommandKind::Buttons => None,
            CommandKind::LcdClear => Some(lcd::CLEAR),
            CommandKind::LcdRefresh => Some(lcd::REFRESH),
            CommandKind::LcdPixel => Some(lcd::PIXEL),
            CommandKind::LcdText => Some(lcd::TEXT),
            CommandKind::LedSet => Some(led::SET),
            CommandKind::LedBlink => Some(led::BLINK),
            CommandKind::I2cClock => Some(i2c::CLOCK),
            CommandKind::I2cRead => Some(i2c::READ),
            CommandKind::I2cWrite => Some(i2c::WRITE),
            CommandKind::SpiConfig => Some(spi::CONFIG),
            CommandKind::SpiTransfer => Some(spi::TRANSFER),
        }
    }
}

/// Badge Command
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    /// Bring the command interface to a known state.
    ///
    /// Sent as a single unframed byte, acknowledged with a bare RESET status.
    Reset,
    /// Pass bytes through the badge UART, returns whatever it received.
    Uart { data: Vec<u8> },
    /// Clear the display buffer
    LcdClear,
    /// Redraw the display from its buffer
    LcdRefresh,
    /// Draw a pixel in the display buffer. x: 0-127, y: 0-63
    LcdPixel { x: u8, y: u8, color: Color },
    /// Draw ASCII text in the display buffer. row: 0-7, col: 0-63
    LcdText { row: u8, col: u8, text: String },
    LedSet { led: Led, on: bool },
    /// Keep blinking an LED with the given period
    LedBlink { led: Led, period: u8 },
    /// Query the button mask
    Buttons,
    /// I2C clock in kHz. Display transfers always run at 400 kHz.
    I2cClock { khz: u16 },
    I2cRead {
        dev_addr: u8,
        reg_addr: Vec<u8>,
        len: u8,
    },
    I2cWrite {
        dev_addr: u8,
        reg_addr: Vec<u8>,
        data: Vec<u8>,
    },
    SpiConfig { khz: u16, mode: SpiMode },
    /// Full-duplex SPI transfer, PB14 (DAC1) is the active-low chip select
    SpiTransfer { data: Vec<u8> },
}

impl Command {
    pub fn uart(data: impl Into<Vec<u8>>) -> Self {
        Command::Uart { data: data.into() }
    }

    pub fn lcd_pixel(x: u8, y: u8, color: Color) -> Self {
        Command::LcdPixel { x, y, color }
    }

    pub fn lcd_text(row: u8, col: u8, text: &str) -> Result<Self> {
        if !text.is_ascii() {
            return Err(Error::invalid("LCD text must be ASCII"));
        }
        if text.len() > u8::MAX as usize {
            return Err(Error::invalid(format!(
                "LCD text length must be in range [0-255], got {}",
                text.len()
            )));
        }
        Ok(Command::LcdText {
            row,
            col,
            text: text.to_string(),
        })
    }

    pub fn led_set(led: Led, on: bool) -> Self {
        Command::LedSet { led, on }
    }

    pub fn led_blink(led: Led, period: u8) -> Self {
        Command::LedBlink { led, period }
    }

    pub fn i2c_clock(khz: u32) -> Result<Self> {
        if !(1..=400).contains(&khz) {
            return Err(Error::invalid(format!(
                "I2C clock must be in range [1-400] kHz, got {}",
                khz
            )));
        }
        Ok(Command::I2cClock { khz: khz as u16 })
    }

    pub fn i2c_read(dev_addr: u8, reg_addr: impl Into<RegAddr>, len: usize) -> Result<Self> {
        let reg_addr = reg_addr.into().to_bytes()?;
        let len = u8::try_from(len).map_err(|_| {
            Error::invalid(format!(
                "Requested data length must be in range [0-255], got {}",
                len
            ))
        })?;
        Ok(Command::I2cRead {
            dev_addr,
            reg_addr,
            len,
        })
    }

    pub fn i2c_write(
        dev_addr: u8,
        reg_addr: impl Into<RegAddr>,
        data: impl Into<Vec<u8>>,
    ) -> Result<Self> {
        let reg_addr = reg_addr.into().to_bytes()?;
        let data = data.into();
        if data.len() > u8::MAX as usize {
            return Err(Error::invalid(format!(
                "Written data length must be in range [0-255], got {}",
                data.len()
            )));
        }
        Ok(Command::I2cWrite {
            dev_addr,
            reg_addr,
            data,
        })
    }

    pub fn spi_config(khz: u32, mode: SpiMode) -> Result<Self> {
        if !(1..=60000).contains(&khz) {
            return Err(Error::invalid(format!(
                "SPI clock must be in range [1-60000] kHz, got {}",
                khz
            )));
        }
        Ok(Command::SpiConfig {
            khz: khz as u16,
            mode,
        })
    }

    pub fn spi_transfer(data: impl Into<Vec<u8>>) -> Result<Self> {
        let data = data.into();
        if data.len() > u8::MAX as usize {
            return Err(Error::invalid(format!(
                "SPI data length must be in range [0-255], got {}",
                data.len()
            )));
        }
        Ok(Command::SpiTransfer { data })
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Reset => CommandKind::Reset,
            Command::Uart { .. } => CommandKind::Uart,
            Command::LcdClear => CommandKind::LcdClear,
            Command::LcdRefresh => CommandKind::LcdRefresh,
            Command::LcdPixel { .. } => CommandKind::LcdPixel,
            Command::LcdText { .. } => CommandKind::LcdText,
            Command::LedSet { .. } => CommandKind::LedSet,
            Command::LedBlink { .. } => CommandKind::LedBlink,
            Command::Buttons => CommandKind::Buttons,
            Command::I2cClock { .. } => CommandKind::I2cClock,
            Command::I2cRead { .. } => CommandKind::I2cRead,
            Command::I2cWrite { .. } => CommandKind::I2cWrite,
            Command::SpiConfig { .. } => CommandKind::SpiConfig,
            Command::SpiTransfer { .. } => CommandKind::SpiTransfer,
        }
    }

    /// Data carried after the type byte: opcode first, then its parameters.
    fn data(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(opcode) = self.kind().opcode() {
            buf.push(opcode);
        }

        match self {
            Command::Reset | Command::LcdClear | Command::LcdRefresh | Command::Buttons => {}
            Command::Uart { data } => buf.extend_from_slice(data),
            Command::LcdPixel { x, y, color } => buf.extend_from_slice(&[*x, *y, *color as u8]),
            Command::LcdText { row, col, text } => {
                buf.extend_from_slice(&[*row, *col, len_byte(text.as_bytes())?]);
                buf.extend_from_slice(text.as_bytes());
            }
            Command::LedSet { led, on } => buf.extend_from_slice(&[*led as u8, *on as u8]),
            Command::LedBlink { led, period } => buf.extend_from_slice(&[*led as u8, *period]),
            Command::I2cClock { khz } => {
                let mut field = [0u8; 2];
                field.pwrite_with(*khz, 0, scroll::BE)?;
                buf.extend_from_slice(&field);
            }
            Command::I2cRead {
                dev_addr,
                reg_addr,
                len,
            } => {
                buf.extend_from_slice(&[*dev_addr, len_byte(reg_addr)?]);
                buf.extend_from_slice(reg_addr);
                buf.push(*len);
            }
            Command::I2cWrite {
                dev_addr,
                reg_addr,
                data,
            } => {
                buf.extend_from_slice(&[*dev_addr, len_byte(reg_addr)?]);
                buf.extend_from_slice(reg_addr);
                buf.push(len_byte(data)?);
                buf.extend_from_slice(data);
            }
            Command::SpiConfig { khz, mode } => {
                // OPCODE, KHZ(BE), MODE
                let mut field = [0u8; 3];
                field.pwrite_with(*khz, 0, scroll::BE)?;
                field[2] = *mode as u8;
                buf.extend_from_slice(&field);
            }
            Command::SpiTransfer { data } => {
                buf.push(len_byte(data)?);
                buf.extend_from_slice(data);
            }
        }
        Ok(buf)
    }

    /// Wire bytes for this command.
    pub fn into_raw(self) -> Result<Vec<u8>> {
        match self {
            Command::Reset => Ok(vec![kind::RESET]),
            cmd => frame::encode(cmd.kind().group(), &cmd.data()?),
        }
    }
}

fn len_byte(field: &[u8]) -> Result<u8> {
    u8::try_from(field.len())
        .map_err(|_| Error::invalid(format!("field of {} bytes exceeds 255", field.len())))
}

/// Response to a Command. The length byte and checksum are stripped.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Response {
    /// Status = OK
    Ok(Vec<u8>),
    /// Otherwise
    Err(u8, Vec<u8>),
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Ok(data) => write!(f, "OK[{}]", hex::encode(data)),
            Response::Err(code, data) => write!(f, "ERROR({:x})[{}]", code, hex::encode(data)),
        }
    }
}

impl Response {
    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok(_))
    }

    pub fn payload(&self) -> &[u8] {
        match self {
            Response::Ok(payload) => payload,
            Response::Err(_, payload) => payload,
        }
    }

    pub fn into_payload(self) -> Result<Vec<u8>> {
        match self {
            Response::Ok(payload) => Ok(payload),
            Response::Err(status, payload) => Err(Error::Protocol { status, payload }),
        }
    }

    /// Parse the bytes following the length byte: status, payload, checksum.
    pub(crate) fn from_raw(raw: &[u8]) -> Result<Self> {
        let (code, payload) = frame::decode_body(raw)?;
        if code == status::OK {
            Ok(Response::Ok(payload.to_vec()))
        } else {
            Ok(Response::Err(code, payload.to_vec()))
        }
    }
}
