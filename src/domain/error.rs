use thiserror::Error;

/// Sercon unified error type
#[derive(Error, Debug)]
pub enum SerconError {
    #[error("Serial device {device} unavailable: {source}")]
    DeviceUnavailable {
        device: String,
        #[source]
        source: serialport::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Subscriber closed")]
    SubscriberClosed,

    #[error("Bridge error: {message}")]
    Bridge { message: String },

    #[error("Capture file {path} error: {source}")]
    Capture {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Terminal error: {0}")]
    Tui(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SerconError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

pub type SerconResult<T> = Result<T, SerconError>;
