//! KiCon badge serial command interface.

pub mod badge;
pub mod config;
pub mod constants;
pub mod error;
pub mod frame;
pub mod protocol;
pub mod reset;
pub mod transport;
pub mod types;

pub use self::badge::{Badge, SharedBadge};
pub use self::config::BadgeConfig;
pub use self::error::{Error, Result};
pub use self::protocol::{Command, CommandKind, Response};
pub use self::transport::Transport;
pub use self::types::{Buttons, Color, Led, RegAddr, SpiMode};
