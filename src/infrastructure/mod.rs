// Infrastructure module - External dependencies and adapters
pub mod capture;
pub mod config;
pub mod logging;
pub mod serial;
pub mod tcp;
