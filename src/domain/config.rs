use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::error::{SerconError, SerconResult};

/// Sercon configuration
///
/// Built once at startup and handed to every component by reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConsoleConfig {
    /// Serial device settings
    #[serde(default)]
    pub serial: SerialSettings,
    /// Network bridge settings
    #[serde(default)]
    pub bridge: BridgeConfig,
    /// Capture file settings
    #[serde(default)]
    pub capture: CaptureConfig,
    /// Reserved keys and key translation
    #[serde(default)]
    pub keys: KeyBindings,
    /// Renderer settings
    #[serde(default)]
    pub render: RenderConfig,
    /// Diagnostic log settings
    #[serde(default)]
    pub log: LogConfig,
}

/// Serial device settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SerialSettings {
    /// Device path, e.g. `/dev/ttyUSB0` or `COM3`
    #[serde(default)]
    pub device: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default = "default_data_bits")]
    pub data_bits: u8,
    #[serde(default = "default_stop_bits")]
    pub stop_bits: u8,
    #[serde(default)]
    pub parity: ParityConfig,
    #[serde(default)]
    pub flow_control: FlowControlConfig,
    /// Bound on a single blocking device read
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u64,
}

/// Parity configuration
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParityConfig {
    #[default]
    None,
    Odd,
    Even,
}

/// Flow control configuration
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlowControlConfig {
    #[default]
    None,
    Hardware,
    Software,
}

/// Network bridge settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BridgeConfig {
    /// Start listening as soon as the console is up
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_bridge_host")]
    pub host: String,
    #[serde(default = "default_bridge_port")]
    pub port: u16,
}

/// Capture file settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaptureConfig {
    /// Open the capture file at startup
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_capture_path")]
    pub path: PathBuf,
}

/// Reserved control keys, given as the letter pressed together with Ctrl
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyBindings {
    #[serde(default = "default_menu_key")]
    pub menu: char,
    #[serde(default = "default_exit_key")]
    pub exit: char,
    /// Byte sent to the device for the Backspace key
    #[serde(default = "default_backspace_byte")]
    pub backspace_byte: u8,
    /// Bytes sent to the device for the Enter key
    #[serde(default = "default_enter_sequence")]
    pub enter_sequence: String,
}

/// Renderer settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderConfig {
    /// Bound on every blocking wait; also the shutdown latency
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_ignore_cr")]
    pub ignore_carriage_return: bool,
}

/// Diagnostic log settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_baud_rate() -> u32 {
    115_200
}

fn default_data_bits() -> u8 {
    8
}

fn default_stop_bits() -> u8 {
    1
}

fn default_read_timeout() -> u64 {
    100
}

fn default_bridge_host() -> String {
    "0.0.0.0".to_string()
}

fn default_bridge_port() -> u16 {
    2323
}

fn default_capture_path() -> PathBuf {
    PathBuf::from("capture.log")
}

fn default_menu_key() -> char {
    'a'
}

fn default_exit_key() -> char {
    'x'
}

fn default_backspace_byte() -> u8 {
    0x08
}

fn default_enter_sequence() -> String {
    "\r".to_string()
}

fn default_poll_interval() -> u64 {
    100
}

fn default_ignore_cr() -> bool {
    true
}

fn default_log_file() -> PathBuf {
    PathBuf::from("sercon.log")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            device: String::new(),
            baud_rate: default_baud_rate(),
            data_bits: default_data_bits(),
            stop_bits: default_stop_bits(),
            parity: ParityConfig::default(),
            flow_control: FlowControlConfig::default(),
            read_timeout_ms: default_read_timeout(),
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_bridge_host(),
            port: default_bridge_port(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_capture_path(),
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            menu: default_menu_key(),
            exit: default_exit_key(),
            backspace_byte: default_backspace_byte(),
            enter_sequence: default_enter_sequence(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            ignore_carriage_return: default_ignore_cr(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            level: default_log_level(),
        }
    }
}

impl SerialSettings {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl RenderConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl BridgeConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl KeyBindings {
    /// Control code produced by Ctrl + `letter`
    pub fn control_code(letter: char) -> u8 {
        (letter.to_ascii_lowercase() as u8) & 0x1f
    }
}

impl ConsoleConfig {
    /// Reject values no component can work with
    pub fn validate(&self) -> SerconResult<()> {
        if self.serial.device.is_empty() {
            return Err(SerconError::config("no serial device given"));
        }
        if self.serial.baud_rate == 0 {
            return Err(SerconError::config("baud rate must be positive"));
        }
        if !(5..=8).contains(&self.serial.data_bits) {
            return Err(SerconError::config(format!(
                "invalid data bits: {}",
                self.serial.data_bits
            )));
        }
        if !(1..=2).contains(&self.serial.stop_bits) {
            return Err(SerconError::config(format!(
                "invalid stop bits: {}",
                self.serial.stop_bits
            )));
        }
        if self.serial.read_timeout_ms == 0 || self.render.poll_interval_ms == 0 {
            return Err(SerconError::config("timeouts must be positive"));
        }
        for (name, key) in [("menu", self.keys.menu), ("exit", self.keys.exit)] {
            if !key.is_ascii_alphabetic() {
                return Err(SerconError::config(format!(
                    "{} key must be an ASCII letter, got {:?}",
                    name, key
                )));
            }
        }
        if self.keys.menu.eq_ignore_ascii_case(&self.keys.exit) {
            return Err(SerconError::config("menu and exit keys must differ"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ConsoleConfig {
        let mut config = ConsoleConfig::default();
        config.serial.device = "/dev/ttyUSB0".to_string();
        config
    }

    #[test]
    fn test_config_serialization() {
        let config = valid_config();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: ConsoleConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: ConsoleConfig = toml::from_str(
            r#"
            [serial]
            device = "/dev/ttyACM0"
            parity = "even"

            [bridge]
            port = 4000
            "#,
        )
        .unwrap();

        assert_eq!(config.serial.device, "/dev/ttyACM0");
        assert_eq!(config.serial.baud_rate, 115_200);
        assert_eq!(config.serial.parity, ParityConfig::Even);
        assert_eq!(config.bridge.port, 4000);
        assert_eq!(config.bridge.host, "0.0.0.0");
        assert_eq!(config.keys.menu, 'a');
        assert!(config.render.ignore_carriage_return);
    }

    #[test]
    fn test_control_code() {
        assert_eq!(KeyBindings::control_code('a'), 0x01);
        assert_eq!(KeyBindings::control_code('A'), 0x01);
        assert_eq!(KeyBindings::control_code('x'), 0x18);
    }

    #[test]
    fn test_validate() {
        assert!(valid_config().validate().is_ok());
        assert!(ConsoleConfig::default().validate().is_err());

        let mut config = valid_config();
        config.serial.data_bits = 9;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.keys.exit = 'A';
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.render.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.keys.menu = '1';
        assert!(config.validate().is_err());
    }
}
