use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use kibadge::constants::{LCD_HEIGHT, LCD_TEXT_ROWS, LCD_WIDTH};
use kibadge::transport::SerialTransport;
use kibadge::{Badge, BadgeConfig, Color, Led, RegAddr, SpiMode};

#[derive(Parser)]
#[command(
    name = "kibadge",
    about = "Command-line interface to the KiCon badge command mode",
    version
)]
struct Cli {
    /// Serial port the badge is attached to (first available port by default)
    #[arg(short, long, global = true)]
    port: Option<String>,
    /// YAML config file
    #[arg(short, long, global = true)]
    config: Option<String>,
    /// Response read timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,
    /// Skip the reset handshake, the badge must already be in command mode
    #[arg(long, global = true)]
    no_reset: bool,
    /// Print every frame sent and received
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available serial ports
    Ports,
    #[command(flatten)]
    Session(SessionCommand),
}

/// Commands that talk to a connected badge
#[derive(Subcommand)]
enum SessionCommand {
    /// Reset the badge into command mode
    Reset,
    /// Send hex bytes over the badge UART and print the reply
    Uart { data: String },
    /// Clear the display buffer
    LcdClear,
    /// Redraw the display
    LcdRefresh,
    /// Draw a pixel (x 0-127, y 0-63, color 0 black / 1 white) and refresh
    LcdPixel {
        #[arg(value_parser = clap::value_parser!(u8).range(..LCD_WIDTH as i64))]
        x: u8,
        #[arg(value_parser = clap::value_parser!(u8).range(..LCD_HEIGHT as i64))]
        y: u8,
        #[arg(default_value_t = 1)]
        color: u8,
    },
    /// Draw text (row 0-7, col 0-63) and refresh
    LcdText {
        #[arg(value_parser = clap::value_parser!(u8).range(..LCD_TEXT_ROWS as i64))]
        row: u8,
        col: u8,
        text: String,
    },
    /// Turn an LED (0 or 1) on or off
    Led {
        led: u8,
        /// on/off, 1/0, yes/no
        #[arg(action = clap::ArgAction::Set, value_parser = clap::builder::BoolishValueParser::new())]
        on: bool,
    },
    /// Keep blinking an LED (0 or 1) with the given period
    LedBlink { led: u8, period: u8 },
    /// Print the pressed buttons
    Buttons,
    /// Set the I2C clock [kHz, 1-400]
    I2cClock { khz: u32 },
    /// Read registers of an I2C device
    I2cRead {
        #[arg(value_parser = parse_int::<u8>)]
        dev_addr: u8,
        #[arg(value_parser = parse_int::<u64>)]
        reg_addr: u64,
        len: usize,
    },
    /// Write hex bytes to registers of an I2C device
    I2cWrite {
        #[arg(value_parser = parse_int::<u8>)]
        dev_addr: u8,
        #[arg(value_parser = parse_int::<u64>)]
        reg_addr: u64,
        data: String,
    },
    /// Configure the SPI clock [kHz, 1-60000] and mode [0-3]
    SpiConfig { khz: u32, mode: i32 },
    /// Transfer hex bytes over SPI and print the reply
    SpiTransfer { data: String },
}

fn parse_int<T: TryFrom<u64>>(s: &str) -> std::result::Result<T, String> {
    let value = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    }
    .map_err(|e| e.to_string())?;
    T::try_from(value).map_err(|_| format!("{} is out of range", s))
}

fn parse_hex(s: &str) -> Result<Vec<u8>> {
    let cleaned: String = s.chars().filter(|c| !c.is_whitespace() && *c != ':').collect();
    hex::decode(cleaned.trim_start_matches("0x"))
        .with_context(|| format!("invalid hex data {:?}", s))
}

fn list_ports() -> Result<()> {
    let ports = SerialTransport::scan_ports()?;
    if ports.is_empty() {
        log::warn!("No serial ports found");
    }
    for port in ports {
        println!("{}", port);
    }
    Ok(())
}

fn connect(cli: &Cli) -> Result<Badge<SerialTransport>> {
    let mut config = match &cli.config {
        Some(path) => BadgeConfig::load(path)?,
        None => BadgeConfig::default(),
    };
    if cli.port.is_some() {
        config.port = cli.port.clone();
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        anyhow::ensure!(timeout_ms > 0, "timeout must be greater than 0");
        config.timeout_ms = timeout_ms;
    }

    if cli.no_reset {
        let transport = match config.port.as_deref() {
            Some(port) => SerialTransport::open_with_timeout(port, config.timeout())?,
            None => SerialTransport::open_any(config.timeout())?,
        };
        Ok(Badge::new(transport).with_timeout(config.timeout()))
    } else {
        Badge::open(&config).context("connecting to badge")
    }
}

fn run(cli: &Cli, command: &SessionCommand) -> Result<()> {
    let mut badge = connect(cli)?;

    match command {
        SessionCommand::Reset => {
            if cli.no_reset {
                badge.init()?;
            }
        }
        SessionCommand::Uart { data } => {
            let reply = badge.uart_transfer(&parse_hex(data)?)?;
            println!("{}", hex::encode(reply));
        }
        SessionCommand::LcdClear => badge.lcd_clear()?,
        SessionCommand::LcdRefresh => badge.lcd_refresh()?,
        SessionCommand::LcdPixel { x, y, color } => {
            badge.lcd_pixel(*x, *y, Color::try_from(*color)?)?;
            badge.lcd_refresh()?;
        }
        SessionCommand::LcdText { row, col, text } => {
            badge.lcd_text(*row, *col, text)?;
            badge.lcd_refresh()?;
        }
        SessionCommand::Led { led, on } => badge.led_set(Led::try_from(*led)?, *on)?,
        SessionCommand::LedBlink { led, period } => {
            badge.led_blink(Led::try_from(*led)?, *period)?
        }
        SessionCommand::Buttons => {
            let buttons = badge.buttons()?;
            println!("{} (0x{:02x})", buttons, buttons.bits());
        }
        SessionCommand::I2cClock { khz } => badge.i2c_set_clock_khz(*khz)?,
        SessionCommand::I2cRead {
            dev_addr,
            reg_addr,
            len,
        } => {
            let data = badge.i2c_read(*dev_addr, RegAddr::from(*reg_addr), *len)?;
            println!("{}", hex::encode(data));
        }
        SessionCommand::I2cWrite {
            dev_addr,
            reg_addr,
            data,
        } => {
            badge.i2c_write(*dev_addr, RegAddr::from(*reg_addr), &parse_hex(data)?)?;
        }
        SessionCommand::SpiConfig { khz, mode } => {
            badge.spi_config(*khz, SpiMode::try_from(*mode)?)?
        }
        SessionCommand::SpiTransfer { data } => {
            let reply = badge.spi_transfer(&parse_hex(data)?)?;
            println!("{}", hex::encode(reply));
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _ = simplelog::TermLogger::init(
        if cli.verbose {
            simplelog::LevelFilter::Debug
        } else {
            simplelog::LevelFilter::Info
        },
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );

    match &cli.command {
        Commands::Ports => list_ports(),
        Commands::Session(command) => run(&cli, command),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_ports_needs_no_session() {
        let cli = Cli::try_parse_from(["kibadge", "ports"]).unwrap();
        assert!(matches!(cli.command, Commands::Ports));
    }

    #[test]
    fn test_lcd_coordinates_bounded_by_geometry() {
        let cli = Cli::try_parse_from(["kibadge", "lcd-pixel", "127", "63", "0"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Session(SessionCommand::LcdPixel { x: 127, y: 63, color: 0 })
        ));
        assert!(Cli::try_parse_from(["kibadge", "lcd-pixel", "128", "0"]).is_err());
        assert!(Cli::try_parse_from(["kibadge", "lcd-pixel", "0", "64"]).is_err());

        assert!(Cli::try_parse_from(["kibadge", "lcd-text", "7", "0", "hi"]).is_ok());
        assert!(Cli::try_parse_from(["kibadge", "lcd-text", "8", "0", "hi"]).is_err());
    }
}
