//! Sercon Library
//!
//! Interactive serial-port console: one reader fans device output out to
//! the terminal renderer, an optional TCP bridge and a capture file, while
//! keystrokes are forwarded back to the device.

pub mod cli;
pub mod core;
pub mod domain;
pub mod infrastructure;
pub mod tui;

pub use crate::core::broadcast::{Broadcaster, Chunk, Subscriber, SubscriberId};
pub use crate::core::process::ProcessState;
pub use crate::core::screen::{ScreenBuffer, ScreenEvent, ScrollRegion};
pub use crate::core::supervisor::{run_with, Console};
pub use crate::domain::config::ConsoleConfig;
pub use crate::domain::error::{SerconError, SerconResult};
pub use crate::infrastructure::serial::SerialLink;
