// Serial module - Device access and key translation
pub mod keymap;
pub mod link;
pub mod testing;

pub use link::{list_ports, PortSummary, SerialLink, SerialReader};
