//! Typed command parameters, validated on construction.

use std::fmt;

use bitfield::bitfield;

use crate::constants::MAX_REG_ADDR_LEN;
use crate::error::{Error, Result};

/// One of the two user LEDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Led {
    Led1 = 0,
    Led2 = 1,
}

impl TryFrom<u8> for Led {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Led::Led1),
            1 => Ok(Led::Led2),
            _ => Err(Error::invalid(format!(
                "invalid LED number {}, expected LED1 (0) or LED2 (1)",
                value
            ))),
        }
    }
}

/// LCD pixel color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    #[default]
    Black = 0,
    White = 1,
}

impl TryFrom<u8> for Color {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Color::Black),
            1 => Ok(Color::White),
            _ => Err(Error::invalid(format!(
                "invalid color {}, expected BLACK (0) or WHITE (1)",
                value
            ))),
        }
    }
}

/// SPI clock polarity/phase.
///
/// - Mode 0: capture on rising edge, shift on falling edge, clock idles low
/// - Mode 1: capture on falling edge, shift on rising edge, clock idles low
/// - Mode 2: capture on falling edge, shift on rising edge, clock idles high
/// - Mode 3: capture on rising edge, shift on falling edge, clock idles high
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpiMode {
    #[default]
    Mode0 = 0,
    Mode1 = 1,
    Mode2 = 2,
    Mode3 = 3,
}

impl TryFrom<i32> for SpiMode {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(SpiMode::Mode0),
            1 => Ok(SpiMode::Mode1),
            2 => Ok(SpiMode::Mode2),
            3 => Ok(SpiMode::Mode3),
            _ => Err(Error::invalid(format!(
                "SPI mode must be in range [0-3], got {}",
                value
            ))),
        }
    }
}

impl TryFrom<u8> for SpiMode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        SpiMode::try_from(value as i32)
    }
}

/// I2C register address, either raw bytes or an integer.
///
/// Integers are sent big-endian in the fewest bytes that hold the value,
/// never fewer than one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RegAddr {
    Bytes(Vec<u8>),
    Int(u64),
}

impl RegAddr {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let bytes = match self {
            RegAddr::Bytes(raw) => raw.clone(),
            RegAddr::Int(value) => {
                let significant = (u64::BITS - value.leading_zeros()) as usize;
                let len = significant.div_ceil(8).max(1);
                value.to_be_bytes()[8 - len..].to_vec()
            }
        };
        if bytes.len() > MAX_REG_ADDR_LEN {
            return Err(Error::invalid(format!(
                "I2C register address cannot be longer than {} bytes (got {})",
                MAX_REG_ADDR_LEN,
                bytes.len()
            )));
        }
        Ok(bytes)
    }
}

impl From<u8> for RegAddr {
    fn from(value: u8) -> Self {
        RegAddr::Int(value as u64)
    }
}

impl From<u16> for RegAddr {
    fn from(value: u16) -> Self {
        RegAddr::Int(value as u64)
    }
}

impl From<u32> for RegAddr {
    fn from(value: u32) -> Self {
        RegAddr::Int(value as u64)
    }
}

impl From<u64> for RegAddr {
    fn from(value: u64) -> Self {
        RegAddr::Int(value)
    }
}

impl From<Vec<u8>> for RegAddr {
    fn from(value: Vec<u8>) -> Self {
        RegAddr::Bytes(value)
    }
}

impl From<&[u8]> for RegAddr {
    fn from(value: &[u8]) -> Self {
        RegAddr::Bytes(value.to_vec())
    }
}

bitfield! {
    /// Button state mask returned by the buttons query.
    ///
    /// LEFT can never be observed as pressed: pressing it makes the badge leave
    /// the command interface mode.
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    pub struct Buttons(u8);
    pub right, _: 0;
    pub left, _: 1;
    pub down, _: 2;
    pub up, _: 3;
}

impl Buttons {
    pub const RIGHT: u8 = 1;
    pub const LEFT: u8 = 2;
    pub const DOWN: u8 = 4;
    pub const UP: u8 = 8;

    pub fn bits(&self) -> u8 {
        self.0
    }
}

impl From<u8> for Buttons {
    fn from(mask: u8) -> Self {
        Buttons(mask)
    }
}

impl fmt::Debug for Buttons {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buttons")
            .field("right", &self.right())
            .field("left", &self.left())
            .field("down", &self.down())
            .field("up", &self.up())
            .finish()
    }
}

impl fmt::Display for Buttons {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pressed: Vec<&str> = [
            (self.right(), "RIGHT"),
            (self.left(), "LEFT"),
            (self.down(), "DOWN"),
            (self.up(), "UP"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect();

        if pressed.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", pressed.join("|"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_led_from_u8() {
        assert_eq!(Led::try_from(0u8).unwrap(), Led::Led1);
        assert_eq!(Led::try_from(1u8).unwrap(), Led::Led2);
        assert!(matches!(Led::try_from(2u8), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_spi_mode_bounds() {
        for mode in 0..=3i32 {
            assert_eq!(SpiMode::try_from(mode).unwrap() as i32, mode);
        }
        assert!(matches!(SpiMode::try_from(-1i32), Err(Error::InvalidArgument(_))));
        assert!(matches!(SpiMode::try_from(4i32), Err(Error::InvalidArgument(_))));
        assert!(matches!(SpiMode::try_from(4u8), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_reg_addr_minimal_big_endian() {
        assert_eq!(RegAddr::from(0u8).to_bytes().unwrap(), vec![0x00]);
        assert_eq!(RegAddr::from(0x10u8).to_bytes().unwrap(), vec![0x10]);
        assert_eq!(RegAddr::from(0x0100u16).to_bytes().unwrap(), vec![0x01, 0x00]);
        assert_eq!(RegAddr::from(0x10u64).to_bytes().unwrap(), vec![0x10]);
        assert_eq!(
            RegAddr::from(0xdead_beefu32).to_bytes().unwrap(),
            vec![0xde, 0xad, 0xbe, 0xef]
        );
    }

    #[test]
    fn test_reg_addr_too_long() {
        assert!(matches!(
            RegAddr::from(0x01_0000_0000u64).to_bytes(),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            RegAddr::from(vec![0u8; 5]).to_bytes(),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(RegAddr::from(&[0u8, 0, 0, 1][..]).to_bytes().unwrap().len(), 4);
    }

    #[test]
    fn test_buttons_mask() {
        let buttons = Buttons(Buttons::RIGHT | Buttons::UP);
        assert!(buttons.right());
        assert!(!buttons.left());
        assert!(!buttons.down());
        assert!(buttons.up());
        assert_eq!(buttons.bits(), 0x09);
        assert_eq!(buttons.to_string(), "RIGHT|UP");
        assert_eq!(Buttons(0).to_string(), "none");
    }
}
