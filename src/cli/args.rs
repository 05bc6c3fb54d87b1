use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::domain::config::{ConsoleConfig, FlowControlConfig, ParityConfig};

/// Command line arguments for sercon
#[derive(Parser, Debug, Default)]
#[command(
    name = "sercon",
    version = env!("CARGO_PKG_VERSION"),
    about = "Interactive serial-port console",
    long_about = "Shows live output of a serial device, forwards keystrokes to it, and can relay the stream to a TCP client or capture received lines to a file."
)]
pub struct Args {
    /// Serial device, e.g. /dev/ttyUSB0 or COM3
    pub device: Option<String>,

    /// Baud rate
    #[arg(short, long)]
    pub baud: Option<u32>,

    /// Data bits (5-8)
    #[arg(long)]
    pub data_bits: Option<u8>,

    /// Stop bits (1-2)
    #[arg(long)]
    pub stop_bits: Option<u8>,

    #[arg(long, value_enum)]
    pub parity: Option<ParityArg>,

    #[arg(long, value_enum)]
    pub flow_control: Option<FlowControlArg>,

    /// Relay the device to a TCP client connecting on this port
    #[arg(short = 'p', long = "listen")]
    pub listen: Option<u16>,

    /// Address the bridge binds to
    #[arg(long)]
    pub bind: Option<String>,

    /// Append received lines to this file
    #[arg(short = 'o', long)]
    pub capture: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Diagnostic log file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// List available serial ports and exit
    #[arg(long)]
    pub list_ports: bool,

    /// Write a project configuration (.sercon/config.toml) and exit
    #[arg(long)]
    pub init_config: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParityArg {
    None,
    Odd,
    Even,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowControlArg {
    None,
    Hardware,
    Software,
}

impl From<ParityArg> for ParityConfig {
    fn from(arg: ParityArg) -> Self {
        match arg {
            ParityArg::None => ParityConfig::None,
            ParityArg::Odd => ParityConfig::Odd,
            ParityArg::Even => ParityConfig::Even,
        }
    }
}

impl From<FlowControlArg> for FlowControlConfig {
    fn from(arg: FlowControlArg) -> Self {
        match arg {
            FlowControlArg::None => FlowControlConfig::None,
            FlowControlArg::Hardware => FlowControlConfig::Hardware,
            FlowControlArg::Software => FlowControlConfig::Software,
        }
    }
}

impl Args {
    /// Overlay the given arguments on a loaded configuration
    pub fn apply(&self, config: &mut ConsoleConfig) {
        if let Some(device) = &self.device {
            config.serial.device = device.clone();
        }
        if let Some(baud) = self.baud {
            config.serial.baud_rate = baud;
        }
        if let Some(bits) = self.data_bits {
            config.serial.data_bits = bits;
        }
        if let Some(bits) = self.stop_bits {
            config.serial.stop_bits = bits;
        }
        if let Some(parity) = self.parity {
            config.serial.parity = parity.into();
        }
        if let Some(flow) = self.flow_control {
            config.serial.flow_control = flow.into();
        }
        if let Some(port) = self.listen {
            config.bridge.enabled = true;
            config.bridge.port = port;
        }
        if let Some(host) = &self.bind {
            config.bridge.host = host.clone();
        }
        if let Some(path) = &self.capture {
            config.capture.enabled = true;
            config.capture.path = path.clone();
        }
        if let Some(file) = &self.log_file {
            config.log.file = file.clone();
        }
        if self.verbose {
            config.log.level = "debug".to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_command_line() {
        let args = Args::try_parse_from([
            "sercon",
            "/dev/ttyACM0",
            "-b",
            "9600",
            "--parity",
            "even",
            "-p",
            "4000",
            "-o",
            "cap.txt",
            "-v",
        ])
        .unwrap();

        let mut config = ConsoleConfig::default();
        args.apply(&mut config);

        assert_eq!(config.serial.device, "/dev/ttyACM0");
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.serial.parity, ParityConfig::Even);
        assert!(config.bridge.enabled);
        assert_eq!(config.bridge.port, 4000);
        assert!(config.capture.enabled);
        assert_eq!(config.capture.path, PathBuf::from("cap.txt"));
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn test_absent_arguments_keep_config() {
        let args = Args::try_parse_from(["sercon"]).unwrap();
        let mut config = ConsoleConfig::default();
        config.serial.device = "COM3".to_string();
        args.apply(&mut config);

        let mut expected = ConsoleConfig::default();
        expected.serial.device = "COM3".to_string();
        assert_eq!(config, expected);
    }

    #[test]
    fn test_rejects_unknown_parity() {
        assert!(Args::try_parse_from(["sercon", "--parity", "mark"]).is_err());
    }
}
