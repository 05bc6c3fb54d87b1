use bytes::Bytes;
use serialport::SerialPortType;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

use crate::core::broadcast::Broadcaster;
use crate::core::input::Key;
use crate::core::process::ProcessState;
use crate::domain::config::{FlowControlConfig, KeyBindings, ParityConfig, SerialSettings};
use crate::domain::error::{SerconError, SerconResult};

use super::keymap::encode_key;

const READ_BUFFER_SIZE: usize = 1024;

type Source = Box<dyn Read + Send>;
type Sink = Arc<Mutex<Box<dyn Write + Send>>>;

/// Write side of the serial device.
///
/// Clones share one device handle; every write holds the lock for its whole
/// duration so keystrokes from different writers never interleave.
#[derive(Clone)]
pub struct SerialLink {
    device: Arc<str>,
    baud_rate: u32,
    sink: Sink,
    bindings: Arc<KeyBindings>,
}

/// Read side of the serial device, consumed by [`SerialReader::run`]
pub struct SerialReader {
    device: Arc<str>,
    source: Source,
    retry_delay: Duration,
}

/// How a failed read affects the read loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadFailure {
    /// Nothing arrived within the read timeout
    Idle,
    Transient,
    /// The device is gone
    Fatal,
}

fn classify_read_error(e: &io::Error) -> ReadFailure {
    match e.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => {
            ReadFailure::Idle
        }
        io::ErrorKind::BrokenPipe
        | io::ErrorKind::NotConnected
        | io::ErrorKind::NotFound
        | io::ErrorKind::UnexpectedEof
        | io::ErrorKind::PermissionDenied => ReadFailure::Fatal,
        _ => ReadFailure::Transient,
    }
}

impl SerialLink {
    /// Open the configured device, split into its write and read halves
    pub fn open(settings: &SerialSettings, bindings: &KeyBindings) -> SerconResult<(Self, SerialReader)> {
        let unavailable = |source| SerconError::DeviceUnavailable {
            device: settings.device.clone(),
            source,
        };

        let port = serialport::new(&settings.device, settings.baud_rate)
            .data_bits(match settings.data_bits {
                5 => serialport::DataBits::Five,
                6 => serialport::DataBits::Six,
                7 => serialport::DataBits::Seven,
                _ => serialport::DataBits::Eight,
            })
            .stop_bits(match settings.stop_bits {
                2 => serialport::StopBits::Two,
                _ => serialport::StopBits::One,
            })
            .parity(match settings.parity {
                ParityConfig::None => serialport::Parity::None,
                ParityConfig::Even => serialport::Parity::Even,
                ParityConfig::Odd => serialport::Parity::Odd,
            })
            .flow_control(match settings.flow_control {
                FlowControlConfig::None => serialport::FlowControl::None,
                FlowControlConfig::Software => serialport::FlowControl::Software,
                FlowControlConfig::Hardware => serialport::FlowControl::Hardware,
            })
            .timeout(settings.read_timeout())
            .open()
            .map_err(unavailable)?;

        let writer = port.try_clone().map_err(unavailable)?;

        info!(device = %settings.device, baud = settings.baud_rate, "Serial port opened");

        Ok(Self::with_io(
            &settings.device,
            settings.baud_rate,
            port,
            writer,
            bindings.clone(),
        ))
    }

    /// Build a link over arbitrary reader/writer halves
    pub fn with_io(
        device: &str,
        baud_rate: u32,
        source: impl Read + Send + 'static,
        sink: impl Write + Send + 'static,
        bindings: KeyBindings,
    ) -> (Self, SerialReader) {
        let device: Arc<str> = Arc::from(device);
        let link = Self {
            device: Arc::clone(&device),
            baud_rate,
            sink: Arc::new(Mutex::new(Box::new(sink))),
            bindings: Arc::new(bindings),
        };
        let reader = SerialReader {
            device,
            source: Box::new(source),
            retry_delay: Duration::from_millis(100),
        };
        (link, reader)
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Translate one key press and send it
    pub fn write_key(&self, key: Key) -> SerconResult<()> {
        let bytes = encode_key(key, &self.bindings);
        if bytes.is_empty() {
            return Ok(());
        }
        self.write_bytes(&bytes)
    }

    /// Send raw bytes, e.g. from a bridge client
    pub fn write_bytes(&self, data: &[u8]) -> SerconResult<()> {
        let mut sink = self
            .sink
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        sink.write_all(data)?;
        sink.flush()?;
        trace!("Sent {} bytes over serial: {}", data.len(), hex::encode(data));
        Ok(())
    }
}

impl std::fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLink")
            .field("device", &self.device)
            .field("baud_rate", &self.baud_rate)
            .finish()
    }
}

impl SerialReader {
    /// Pause after a transient read error before retrying
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Read until the process stops, publishing every non-empty read.
    ///
    /// A fatal device error stops the whole process and is returned.
    pub fn run(mut self, broadcaster: &Broadcaster, process: &ProcessState) -> SerconResult<()> {
        info!(device = %self.device, "Serial reader started");
        let mut buffer = vec![0u8; READ_BUFFER_SIZE];

        while process.is_running() {
            match self.source.read(&mut buffer) {
                Ok(0) => {
                    // End of stream from a source that never times out.
                    trace!(device = %self.device, "Serial read returned no data");
                    std::thread::sleep(self.retry_delay);
                }
                Ok(n) => {
                    debug!("Received {} bytes over serial", n);
                    broadcaster.publish(Bytes::copy_from_slice(&buffer[..n]));
                }
                Err(e) => match classify_read_error(&e) {
                    ReadFailure::Idle => continue,
                    ReadFailure::Transient => {
                        warn!(device = %self.device, "Serial read failed, retrying: {}", e);
                        std::thread::sleep(self.retry_delay);
                    }
                    ReadFailure::Fatal => {
                        error!(device = %self.device, "Serial device lost: {}", e);
                        process.stop();
                        return Err(e.into());
                    }
                },
            }
        }

        info!(device = %self.device, "Serial reader stopped");
        Ok(())
    }
}

/// One entry of the available serial ports listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSummary {
    pub name: String,
    pub kind: String,
    pub description: String,
}

pub fn list_ports() -> SerconResult<Vec<PortSummary>> {
    let ports = serialport::available_ports().map_err(|e| SerconError::InvalidInput(format!(
        "Failed to list serial ports: {}",
        e
    )))?;

    Ok(ports
        .into_iter()
        .map(|port| {
            let (kind, description) = match port.port_type {
                SerialPortType::UsbPort(usb) => (
                    "usb".to_string(),
                    format!(
                        "{:04x}:{:04x} {}",
                        usb.vid,
                        usb.pid,
                        usb.product.unwrap_or_default()
                    )
                    .trim_end()
                    .to_string(),
                ),
                SerialPortType::PciPort => ("pci".to_string(), String::new()),
                SerialPortType::BluetoothPort => ("bluetooth".to_string(), String::new()),
                SerialPortType::Unknown => ("unknown".to_string(), String::new()),
            };
            PortSummary {
                name: port.port_name,
                kind,
                description,
            }
        })
        .collect())
}
