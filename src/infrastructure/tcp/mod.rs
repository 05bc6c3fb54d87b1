// TCP module - Network bridge to the serial stream
pub mod bridge;

pub use bridge::{BridgeController, BridgeState, NetworkBridge};
