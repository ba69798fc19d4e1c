use std::time::Duration;

use clap::{Parser, Subcommand};
use tplink_core::DEFAULT_PORT;

/// Parses a whole number of seconds.
pub fn parse_duration(arg: &str) -> Result<Duration, std::num::ParseIntError> {
    let seconds = arg.parse()?;
    Ok(Duration::from_secs(seconds))
}

/// TP-Link smart bulb and plug client
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show version information for CLI and core library
    Version,

    /// Send a command to a specific device
    Device {
        /// Target hostname or IP address
        #[arg(env = "TPLINK_HOST")]
        target: String,

        /// Target port
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Timeout in seconds for connect and each read/write
        #[arg(long, value_parser = parse_duration, default_value = "5")]
        timeout: Duration,

        #[command(subcommand)]
        command: DeviceCommand,
    },
}

/// Commands available for single device operations
#[derive(Subcommand)]
pub enum DeviceCommand {
    /// Get system info
    Info,
    /// Turn relay on
    On,
    /// Turn relay off
    Off,
    /// Turn LED on
    Ledon,
    /// Turn LED off
    Ledoff,
    /// Rename the device
    Alias {
        /// New device name
        name: String,
    },
    /// Reboot the device
    Reboot {
        /// Delay in seconds before rebooting
        #[arg(long, default_value = "1")]
        delay: u32,
    },
    /// Get real-time power readings and calibration gains
    Energy,
    /// Get daily energy usage for one month
    DayStats {
        /// Month (1-12)
        #[arg(value_parser = clap::value_parser!(u32).range(1..=12))]
        month: u32,
        /// Year
        year: i32,
    },
    /// Get monthly energy usage for one year
    MonthStats {
        /// Year
        year: i32,
    },
    /// Reset energy meter statistics
    EnergyReset,
    /// Smart bulb commands
    #[command(subcommand)]
    Bulb(BulbCommand),
    /// Send a raw system/command pair
    Raw {
        /// System name, e.g. "system" or "emeter"
        system: String,
        /// Command name, e.g. "get_sysinfo"
        command: String,
        /// JSON parameter object (omit for a bare query)
        params: Option<String>,
    },
}

/// Commands for smart bulbs
#[derive(Subcommand)]
pub enum BulbCommand {
    /// Show power, color, temperature and brightness
    State,
    /// Switch the bulb on
    On,
    /// Switch the bulb off
    Off,
    /// Set brightness in percent
    Brightness {
        #[arg(allow_hyphen_values = true)]
        percent: i32,
    },
    /// Set color temperature in Kelvin
    Temperature { kelvin: u32 },
    /// Set color: hue 0-100, saturation 0-100, value 0-255
    Hsv {
        #[arg(allow_hyphen_values = true)]
        hue: i32,
        #[arg(allow_hyphen_values = true)]
        saturation: i32,
        #[arg(allow_hyphen_values = true)]
        value: i32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
        assert!(parse_duration("x").is_err());
    }

    #[test]
    fn test_parse_bulb_hsv() {
        let cli = Cli::try_parse_from([
            "tplink", "device", "10.0.0.2", "bulb", "hsv", "50", "100", "255",
        ])
        .unwrap();

        match cli.command {
            Command::Device {
                target,
                port,
                command: DeviceCommand::Bulb(BulbCommand::Hsv { hue, saturation, value }),
                ..
            } => {
                assert_eq!(target, "10.0.0.2");
                assert_eq!(port, DEFAULT_PORT);
                assert_eq!((hue, saturation, value), (50, 100, 255));
            }
            _ => panic!("unexpected command"),
        }
    }

    #[test]
    fn test_day_stats_month_range() {
        assert!(Cli::try_parse_from(["tplink", "device", "h", "day-stats", "13", "2023"]).is_err());
        assert!(Cli::try_parse_from(["tplink", "device", "h", "day-stats", "6", "2023"]).is_ok());
    }
}
